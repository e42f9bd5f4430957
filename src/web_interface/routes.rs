use std::sync::Arc;

use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use super::types::{ApiError, StartQuery};
use crate::host_info;
use crate::session_management::session_manager::SessionManager;

/// GET /
pub fn dashboard_route() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path::end().and(warp::get()).and_then(|| async move {
        let html = r#"<html><head><title>Sonde</title></head>
                <body><h1>Sonde is running</h1><p>See /status and /info for JSON.</p></body></html>"#;
        Ok::<_, Rejection>(reply::html(html))
    })
}

/// GET /info
pub fn host_info_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("info")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let manager = manager.clone();
            async move {
                let capturing = manager.is_capturing().await;
                let info = host_info::gather(capturing);
                Ok::<_, Rejection>(reply::json(&info))
            }
        })
}

/// GET /status
pub fn status_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let manager = manager.clone();
            async move {
                let capturing = manager.is_capturing().await;
                Ok::<_, Rejection>(reply::json(&capturing))
            }
        })
}

/// GET /start?a=<adapter>
pub fn start_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("start")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<StartQuery>())
        .and_then(move |query: StartQuery| {
            let manager = manager.clone();
            async move {
                match manager.start(&query.a).await {
                    Ok(()) => {
                        let res = reply::with_status(reply::reply(), StatusCode::OK)
                            .into_response();
                        Ok::<_, Rejection>(res)
                    }
                    Err(e) => {
                        let res = reply::with_status(
                            reply::json(&ApiError {
                                message: e.to_string(),
                            }),
                            StatusCode::FORBIDDEN,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                }
            }
        })
}

/// GET /stop
pub fn stop_route(
    manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("stop")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(move || {
            let manager = manager.clone();
            async move {
                match manager.stop().await {
                    Ok(()) => {
                        let res = reply::with_status(reply::reply(), StatusCode::OK)
                            .into_response();
                        Ok::<_, Rejection>(res)
                    }
                    Err(e) => {
                        let res = reply::with_status(
                            reply::json(&ApiError {
                                message: e.to_string(),
                            }),
                            StatusCode::INTERNAL_SERVER_ERROR,
                        )
                        .into_response();
                        Ok::<_, Rejection>(res)
                    }
                }
            }
        })
}

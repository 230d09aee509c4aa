//! HTTP viewer for scatter plots. Each view is an independent axum server on its own port.

use crate::error::{CliError, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use scaffviz::workflows::plot::ScatterPlot;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const PAGE_TEMPLATE: &str = include_str!("page.html");

/// A finished plot and the name it is shown under.
#[derive(Debug, Clone)]
pub struct View {
    pub title: String,
    pub plot: Arc<ScatterPlot>,
}

#[derive(Clone)]
struct ViewState {
    page: Arc<String>,
    figure: Bytes,
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders the viewer page. With `figure`, the plot is embedded and the page works offline from the server.
pub fn render_page(title: &str, figure: Option<&ScatterPlot>) -> Result<String> {
    let inline = match figure {
        // `</` would end the script element early.
        Some(plot) => serde_json::to_string(plot)
            .map_err(|e| CliError::Other(e.into()))?
            .replace("</", "<\\/"),
        None => "null".to_string(),
    };
    Ok(PAGE_TEMPLATE
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{FIGURE}}", &inline))
}

pub fn router(view: &View) -> Result<Router> {
    let figure = serde_json::to_vec(view.plot.as_ref()).map_err(|e| CliError::Other(e.into()))?;
    let state = ViewState {
        page: Arc::new(render_page(&view.title, None)?),
        figure: Bytes::from(figure),
    };
    Ok(Router::new()
        .route("/", get(index))
        .route("/figure.json", get(figure_json))
        .route("/health", get(health))
        .with_state(state))
}

async fn index(State(state): State<ViewState>) -> Html<String> {
    Html(state.page.as_ref().clone())
}

async fn figure_json(State(state): State<ViewState>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/json")], state.figure)
}

async fn health() -> &'static str {
    "ok"
}

/// Serves every view on its port until Ctrl-C, then shuts all of them down gracefully.
///
/// Binding happens before anything is served, so a taken port fails the whole call.
pub async fn serve_views(host: &str, views: Vec<(u16, View)>) -> Result<()> {
    let (shutdown_sender, shutdown_receiver) = watch::channel(false);
    let mut servers = JoinSet::new();

    let mut bound = Vec::with_capacity(views.len());
    for (port, view) in views {
        let addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| CliError::Server {
                addr: addr.clone(),
                source,
            })?;
        bound.push((addr, listener, view));
    }

    for (addr, listener, view) in bound {
        let app = router(&view)?.layer(TraceLayer::new_for_http());
        info!(%addr, view = %view.title, "Serving view.");
        println!("Serving '{}' at http://{}/", view.title, addr);

        let mut shutdown = shutdown_receiver.clone();
        servers.spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.wait_for(|stop| *stop).await;
                })
                .await
                .map_err(|source| CliError::Server { addr, source })
        });
    }

    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received.");
            signal.map_err(CliError::Io)
        }
        Some(finished) = servers.join_next() => {
            warn!("A view stopped before shutdown was requested.");
            match finished {
                Ok(result) => result,
                Err(e) => Err(CliError::Other(anyhow::anyhow!("View task failed: {}", e))),
            }
        }
    };

    let _ = shutdown_sender.send(true);
    while let Some(finished) = servers.join_next().await {
        match finished {
            Ok(Err(e)) => warn!("View shut down with an error: {}", e),
            Err(e) => warn!("View task failed: {}", e),
            Ok(Ok(())) => {}
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use scaffviz::workflows::plot::{Axis, Cards, Coloring, Layout, Point};
    use tower::ServiceExt;

    fn view() -> View {
        let plot = ScatterPlot {
            x: Axis {
                column: "PCA_1".to_string(),
                title: "PC_1 (60.0 %)".to_string(),
            },
            y: Axis {
                column: "PCA_2".to_string(),
                title: "PC_2 (25.0 %)".to_string(),
            },
            coloring: Coloring::None,
            cards: Cards {
                title_column: "SMILES".to_string(),
                structure_columns: vec!["SMILES".to_string()],
                caption_columns: vec!["SMILES".to_string()],
            },
            layout: Layout {
                width: 1600,
                height: 800,
                background: "white".to_string(),
            },
            points: vec![Point {
                row: 0,
                x: 0.5,
                y: -1.0,
                category: None,
                value: None,
                title: Some("c1ccccc1</script>".to_string()),
                structures: vec![Some("c1ccccc1".to_string())],
                captions: vec![Some("c1ccccc1".to_string())],
            }],
        };
        View {
            title: "Actives <test>".to_string(),
            plot: Arc::new(plot),
        }
    }

    async fn get_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn index_serves_the_viewer_page() {
        let (status, body) = get_body(router(&view()).unwrap(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Actives &lt;test&gt;"));
        assert!(body.contains("const INLINE_FIGURE = null;"));
    }

    #[tokio::test]
    async fn figure_endpoint_returns_the_plot_model() {
        let (status, body) = get_body(router(&view()).unwrap(), "/figure.json").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["x"]["column"], "PCA_1");
        assert_eq!(value["coloring"]["type"], "none");
        assert_eq!(value["points"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn health_and_unknown_routes() {
        let (status, body) = get_body(router(&view()).unwrap(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
        let (status, _) = get_body(router(&view()).unwrap(), "/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn standalone_page_embeds_the_figure_safely() {
        let view = view();
        let page = render_page(&view.title, Some(view.plot.as_ref())).unwrap();
        assert!(page.contains("\"column\":\"PCA_1\""));
        assert!(page.contains("c1ccccc1<\\/script>"));
        assert!(!page.contains("{{FIGURE}}"));
    }

    #[tokio::test]
    async fn taken_port_fails_before_serving() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let result = serve_views("127.0.0.1", vec![(port, view())]).await;
        assert!(matches!(result, Err(CliError::Server { .. })));
    }
}

//! Embedded page templates

use axum::response::Html;
use minijinja::Environment;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;

#[derive(RustEmbed)]
#[folder = "views/"]
struct Views;

/// Template environment backed by the embedded `views/` directory
#[derive(Clone)]
pub struct Pages {
    env: Arc<Environment<'static>>,
}

impl Pages {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_loader(|name| {
            Ok(Views::get(name).map(|file| String::from_utf8_lossy(&file.data).into_owned()))
        });
        Self { env: Arc::new(env) }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<Html<String>> {
        let template = self.env.get_template(name)?;
        Ok(Html(template.render(ctx)?))
    }
}

impl Default for Pages {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_render_index() {
        let Html(body) = Pages::new()
            .render("index.html", context! { title => "Gatehouse", max_username => 64 })
            .unwrap();
        assert!(body.contains("action=\"/register\""));
        assert!(body.contains("action=\"/login\""));
    }

    #[test]
    fn test_dashboard_escapes_username() {
        let Html(body) = Pages::new()
            .render(
                "dashboard.html",
                context! { title => "Gatehouse", username => "<script>" },
            )
            .unwrap();
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>"));
    }

    #[test]
    fn test_unknown_template() {
        assert!(Pages::new().render("missing.html", ()).is_err());
    }
}

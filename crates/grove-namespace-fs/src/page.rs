//! Static pages served from files.

use grove_namespace::{Handler, Markup, RenderContext, RenderError, Rendered, async_trait};

/// Page handler returning fixed HTML read at discovery time.
pub(crate) struct StaticPage {
    html: Markup,
}

impl StaticPage {
    pub(crate) fn new(html: String) -> Self {
        Self {
            html: Markup::raw(html),
        }
    }
}

#[async_trait]
impl Handler for StaticPage {
    async fn call(&self, _cx: &mut RenderContext) -> Result<Rendered, RenderError> {
        Ok(Rendered::from(self.html.clone()))
    }
}

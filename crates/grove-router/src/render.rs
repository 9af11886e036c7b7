//! Request-time composition.
//!
//! The leaf handler runs first; its value then climbs the layout chain from
//! the innermost layout outward. A [`Rendered::Broken`] value stops the climb
//! and is served as-is, as is any [`Value::Response`].

use grove_namespace::{LayoutInput, RenderContext, RenderError, Rendered, SlotMap, Value};

use crate::chain::LayoutRef;
use crate::route::{RenderOptions, RouteEntry};
use crate::template::CHILDREN_SLOT;

/// Invoke `route` and compose its output.
///
/// The route's metadata is resolved after the handler runs, so providers
/// see anything the handler stored in `cx`.
///
/// # Errors
///
/// Returns [`RenderError`] from the handler, the metadata provider or any
/// layout, or when a value doesn't fit the layout it reaches.
pub async fn render_route(
    route: &RouteEntry,
    options: &RenderOptions,
    cx: &mut RenderContext,
) -> Result<Value, RenderError> {
    let rendered = route.handler.call(cx).await?;

    if let Some(source) = &route.metadata {
        let metadata = source.resolve(cx).await?;
        cx.metadata.merge(metadata);
    }

    if route.wrapped {
        compose(&route.layout_chain, rendered, options, cx).await
    } else {
        finalize_bare(rendered.into_value())
    }
}

/// Feed `rendered` through `chain`, innermost layout first.
///
/// # Errors
///
/// See [`render_route`].
pub async fn compose(
    chain: &[LayoutRef],
    rendered: Rendered,
    options: &RenderOptions,
    cx: &mut RenderContext,
) -> Result<Value, RenderError> {
    let mut current = rendered;

    for (applied, layout) in chain.iter().rev().enumerate() {
        let value = match current {
            Rendered::Broken(value) => {
                tracing::debug!(
                    skipped = chain.len() - applied,
                    "Layout break, skipping remaining layouts"
                );
                return finalize(value);
            }
            Rendered::Plain(Value::Response(response)) => return Ok(Value::Response(response)),
            Rendered::Plain(value) => value,
        };
        current = apply(layout, value, options, cx).await?;
    }

    finalize(current.into_value())
}

async fn apply(
    layout: &LayoutRef,
    value: Value,
    options: &RenderOptions,
    cx: &mut RenderContext,
) -> Result<Rendered, RenderError> {
    match layout {
        LayoutRef::Template(template) => {
            let slots = match value {
                Value::Component(markup) => SlotMap::from([(CHILDREN_SLOT.to_owned(), markup)]),
                Value::Slots(slots) => slots,
                other => {
                    return Err(RenderError::TypeMismatch {
                        layout: template.path.clone(),
                        expected: LayoutInput::Any,
                        found: other.shape(),
                    });
                }
            };
            let markup = template.template.render(
                &slots,
                &options.default_slots,
                &cx.metadata,
                options.missing_metadata,
            )?;
            Ok(Rendered::Plain(Value::Component(markup)))
        }
        LayoutRef::Structured { path, layout, .. } => {
            let expected = layout.accepts();
            if !expected.admits(value.shape()) {
                return Err(RenderError::TypeMismatch {
                    layout: path.clone(),
                    expected,
                    found: value.shape(),
                });
            }
            layout.wrap(value, cx).await
        }
    }
}

/// Only components and responses can leave a layout chain.
fn finalize(value: Value) -> Result<Value, RenderError> {
    match value {
        Value::Component(_) | Value::Response(_) => Ok(value),
        other => Err(RenderError::NotRenderable {
            found: other.shape(),
        }),
    }
}

/// Bare routes may also serve structured data.
fn finalize_bare(value: Value) -> Result<Value, RenderError> {
    match value {
        Value::Slots(_) => Err(RenderError::NotRenderable {
            found: value.shape(),
        }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use grove_namespace::{
        Handler, Layout, Markup, Metadata, Method, RequestInfo, ResponseOverride, handler_fn,
        layout_fn,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::chain::TemplateLayout;
    use crate::route::{RouteKind, RouteTable};
    use crate::template::{MissingMetadata, ParsedTemplate};

    fn cx() -> RenderContext {
        RenderContext::new(RequestInfo::new(Method::Get, "/"))
    }

    fn template(path: &str, text: &str) -> LayoutRef {
        LayoutRef::Template(Arc::new(TemplateLayout {
            node: 0,
            path: path.to_owned(),
            template: ParsedTemplate::parse(text).unwrap(),
        }))
    }

    fn structured(path: &str, layout: Arc<dyn Layout>) -> LayoutRef {
        LayoutRef::Structured {
            node: 0,
            path: path.to_owned(),
            layout,
        }
    }

    /// Structured layout that counts its invocations.
    fn counting(calls: &Arc<AtomicUsize>, tag: &'static str) -> Arc<dyn Layout> {
        let calls = Arc::clone(calls);
        layout_fn(LayoutInput::Component, move |child, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            match child {
                Value::Component(inner) => {
                    Ok(Markup::raw(format!("<{tag}>{inner}</{tag}>")).into())
                }
                other => Ok(Rendered::Plain(other)),
            }
        })
    }

    fn route(handler: Arc<dyn Handler>, chain: Vec<LayoutRef>) -> RouteEntry {
        RouteEntry {
            method: Method::Get,
            url_pattern: "/".to_owned(),
            name: "page".to_owned(),
            kind: RouteKind::Page,
            node: 0,
            node_path: String::new(),
            segments: Vec::new(),
            handler,
            layout_chain: chain.into(),
            metadata: None,
            wrapped: true,
        }
    }

    async fn run(route: &RouteEntry, options: &RenderOptions) -> Result<Value, RenderError> {
        render_route(route, options, &mut cx()).await
    }

    #[tokio::test]
    async fn test_component_binds_to_children() {
        let page = route(
            handler_fn(|_| Ok(Markup::raw("<p>hi</p>").into())),
            vec![template("", "<main><!-- slot[children] --></main>")],
        );
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::component("<main><p>hi</p></main>"));
    }

    #[tokio::test]
    async fn test_slots_fill_named_slots() {
        let page = route(
            handler_fn(|_| Ok(Value::slots([("title", "T"), ("body", "B")]).into())),
            vec![template("", "<h1><!-- slot[title] --></h1><!-- slot[body] -->")],
        );
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::component("<h1>T</h1>B"));
    }

    #[tokio::test]
    async fn test_innermost_layout_applies_first() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = route(
            handler_fn(|_| Ok(Markup::raw("x").into())),
            vec![
                structured("", counting(&calls, "outer")),
                structured("a", counting(&calls, "inner")),
            ],
        );
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::component("<outer><inner>x</inner></outer>"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_leaf_break_skips_every_layout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = route(
            handler_fn(|_| Ok(Rendered::layout_break(Markup::raw("<p>bare</p>")))),
            vec![
                structured("", counting(&calls, "a")),
                structured("b", counting(&calls, "b")),
            ],
        );
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::component("<p>bare</p>"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_layout_break_mid_chain() {
        let calls = Arc::new(AtomicUsize::new(0));
        let breaking = layout_fn(LayoutInput::Any, |child, _| Ok(Rendered::Broken(child)));
        let page = route(
            handler_fn(|_| Ok(Markup::raw("x").into())),
            vec![
                structured("", counting(&calls, "root")),
                structured("mid", breaking),
            ],
        );
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::component("x"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_response_bypasses_layouts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = route(
            handler_fn(|_| Ok(ResponseOverride::redirect("/login").into())),
            vec![structured("", counting(&calls, "root"))],
        );
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::Response(ResponseOverride::redirect("/login")));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_structured_layout_rejects_wrong_shape() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = route(
            handler_fn(|_| Ok(Value::slots([("a", "1")]).into())),
            vec![structured("docs", counting(&calls, "docs"))],
        );
        let err = run(&page, &RenderOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::TypeMismatch { ref layout, expected: LayoutInput::Component, .. }
                if layout == "docs"
        ));
    }

    #[tokio::test]
    async fn test_template_rejects_data() {
        let page = route(
            handler_fn(|_| Ok(Value::Data(json!({"a": 1})).into())),
            vec![template("", "<!-- slot[children] -->")],
        );
        let err = run(&page, &RenderOptions::default()).await.unwrap_err();
        assert!(matches!(err, RenderError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_unwrapped_slots_not_renderable() {
        let page = route(handler_fn(|_| Ok(Value::slots([("a", "1")]).into())), vec![]);
        let err = run(&page, &RenderOptions::default()).await.unwrap_err();
        assert!(matches!(err, RenderError::NotRenderable { .. }));
    }

    #[tokio::test]
    async fn test_bare_route_serves_data() {
        let mut api = route(handler_fn(|_| Ok(Value::Data(json!([1, 2])).into())), vec![]);
        api.wrapped = false;
        let value = run(&api, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::Data(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_metadata_resolved_after_handler() {
        let mut page = route(
            handler_fn(|cx| {
                cx.set("user", "ada");
                Ok(Markup::raw("x").into())
            }),
            vec![template("", "<title>{metadata[title]}</title>")],
        );
        page.metadata = Some(grove_namespace::metadata_fn(|cx| {
            let user = cx.get("user").and_then(|v| v.as_str()).unwrap_or("?");
            Ok(Metadata::new().with("title", format!("{user} & co")))
        }));
        let value = run(&page, &RenderOptions::default()).await.unwrap();
        assert_eq!(value, Value::component("<title>ada &amp; co</title>"));
    }

    #[tokio::test]
    async fn test_missing_metadata_policy() {
        let page = route(
            handler_fn(|_| Ok(Markup::raw("x").into())),
            vec![template("", "<title>{metadata[title]}</title>")],
        );

        let err = run(&page, &RenderOptions::default()).await.unwrap_err();
        assert!(matches!(err, RenderError::MissingMetadata { ref key } if key == "title"));

        let lenient = RenderOptions {
            missing_metadata: MissingMetadata::Empty,
            ..RenderOptions::default()
        };
        assert_eq!(
            run(&page, &lenient).await.unwrap(),
            Value::component("<title></title>")
        );
    }

    #[tokio::test]
    async fn test_default_slots_fill_gaps() {
        let page = route(
            handler_fn(|_| Ok(Markup::raw("body").into())),
            vec![template("", "<!-- slot[navbar] -->|<!-- slot[children] -->")],
        );
        let options = RenderOptions {
            default_slots: SlotMap::from([("navbar".to_owned(), Markup::raw("<nav/>"))]),
            ..RenderOptions::default()
        };
        let table = RouteTable::new(vec![page], Default::default(), options).unwrap();
        let value = table
            .render(&table.routes()[0], &mut cx())
            .await
            .unwrap();
        assert_eq!(value, Value::component("<nav/>|body"));
    }
}

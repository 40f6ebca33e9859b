use serde_json::json;
use treeform::{Processor, Template, TransformError};

fn main() -> Result<(), TransformError> {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "treeform=debug");
        }
    }
    env_logger::init();

    let data = json!({
        "title": "Quarterly Report",
        "orders": [
            { "id": "A-17", "total": 120 },
            { "id": "A-18", "total": 80 },
            { "id": "B-02", "total": 300 },
        ],
    });

    let result = Processor::jsonpath(data)
        .template(Template::matching("$", |ctx, _, _| {
            ctx.element("report", |ctx| {
                ctx.element("h1", |ctx| ctx.value_of("$.title"))?;
                ctx.element("orders", |ctx| ctx.apply_templates(Some("$.orders[*]"), None))
            })?;
            Ok(None)
        }))
        .template(Template::matching("$.orders[*]", |ctx, _, _| {
            ctx.element("order", |ctx| {
                let id = ctx.evaluate("id")?;
                ctx.attribute("id", id.as_str().unwrap_or(""))?;
                ctx.value_of("total")
            })?;
            Ok(None)
        }))
        .success(|output| {
            if let Some(text) = output.as_text() {
                println!("{}", text);
            }
        })
        .transform(None)?;

    println!("documents: {}", result.documents.len());
    Ok(())
}

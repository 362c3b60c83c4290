use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_string_to_file(filename: &str, content: &str) -> std::io::Result<()> {
    let path = Path::new(filename);
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    handlebars_helper!(exists: |v: Value| !v.is_null());
    handlebars.register_helper("exists", Box::new(exists));

    // Infinite costs are materialized as null, so "is a number" doubles as
    // "is finite" in templates.
    handlebars_helper!(finite: |v: Value| v.is_number());
    handlebars.register_helper("finite", Box::new(finite));

    handlebars_helper!(fixed: |v: f64, digits: u64| format!("{:.*}", digits as usize, v));
    handlebars.register_helper("fixed", Box::new(fixed));

    handlebars
}

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;

pub struct CliLogger {
    json: bool,
    no_color: bool,
}

impl CliLogger {
    pub fn new(json: bool, no_color: bool) -> Self {
        Self { json, no_color }
    }

    pub fn print_serialized<T: Serialize>(&self, value: &T) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
            return Ok(());
        }
        let mut out = String::new();
        render(&mut out, &serde_json::to_value(value)?, 0);
        println!("{}", out.trim_end());
        Ok(())
    }

    pub fn print_error(&self, msg: &str) {
        if self.json {
            let out = serde_json::json!({
                "status": "error",
                "message": msg,
            });
            println!("{out}");
            return;
        }
        eprintln!("{} {msg}", self.style("error", "31;1"));
    }

    fn style(&self, text: &str, ansi: &str) -> String {
        if self.no_color {
            return text.to_string();
        }
        format!("\x1b[{ansi}m{text}\x1b[0m")
    }
}

fn render(out: &mut String, value: &Value, indent: usize) {
    let pad = "  ".repeat(indent);
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                if is_compound(nested) {
                    out.push_str(&format!("{pad}{key}:\n"));
                    render(out, nested, indent + 1);
                } else {
                    out.push_str(&format!("{pad}{key}: {}\n", scalar(nested)));
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                if is_compound(item) {
                    out.push_str(&format!("{pad}-\n"));
                    render(out, item, indent + 1);
                } else {
                    out.push_str(&format!("{pad}- {}\n", scalar(item)));
                }
            }
        }
        other => out.push_str(&format!("{pad}{}\n", scalar(other))),
    }
}

fn is_compound(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
        other => other.to_string(),
    }
}

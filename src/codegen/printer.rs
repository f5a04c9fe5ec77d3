//! Renders the Python IR to source text.

use super::ir::{Expr, Module, Stmt};

pub fn render(module: &Module) -> String {
    let mut out = String::new();
    for stmt in &module.body {
        render_stmt(stmt, &mut out);
    }
    out
}

fn render_stmt(stmt: &Stmt, out: &mut String) {
    match stmt {
        Stmt::Comment(text) => {
            // Comments are single-line; embedded line breaks would end them.
            let flat: String = text
                .chars()
                .map(|c| if c.is_control() { ' ' } else { c })
                .collect();
            out.push_str("# ");
            out.push_str(flat.trim_end());
            out.push('\n');
        }
        Stmt::Blank => out.push('\n'),
        Stmt::Assign(target, value) => {
            out.push_str(target.as_str());
            out.push_str(" = ");
            render_expr(value, out);
            out.push('\n');
        }
        Stmt::Expr(expr) => {
            render_expr(expr, out);
            out.push('\n');
        }
        Stmt::Verbatim(text) => {
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
    }
}

pub fn render_expr(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Name(ident) => out.push_str(ident.as_str()),
        Expr::Attr(base, attr) => {
            render_expr(base, out);
            out.push('.');
            out.push_str(attr.as_str());
        }
        Expr::None => out.push_str("None"),
        Expr::Bool(true) => out.push_str("True"),
        Expr::Bool(false) => out.push_str("False"),
        Expr::Int(i) => out.push_str(&i.to_string()),
        Expr::Float(f) => out.push_str(&format_float(*f)),
        Expr::Str(s) => out.push_str(&quote_str(s)),
        Expr::List(items) => {
            out.push('[');
            render_seq(items, out);
            out.push(']');
        }
        Expr::Dict(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render_expr(key, out);
                out.push_str(": ");
                render_expr(value, out);
            }
            out.push('}');
        }
        Expr::Call { func, args, kwargs } => {
            render_expr(func, out);
            out.push('(');
            render_seq(args, out);
            for (i, (name, value)) in kwargs.iter().enumerate() {
                if i > 0 || !args.is_empty() {
                    out.push_str(", ");
                }
                out.push_str(name.as_str());
                out.push('=');
                render_expr(value, out);
            }
            out.push(')');
        }
    }
}

fn render_seq(items: &[Expr], out: &mut String) {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        render_expr(item, out);
    }
}

/// Python float literal. Integral values keep a `.0`; non-finite values use
/// `float(...)` since Python has no literal for them.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "float(\"nan\")".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "float(\"inf\")".to_string()
        } else {
            "-float(\"inf\")".to_string()
        };
    }
    if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// Double-quoted Python string literal.
pub fn quote_str(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

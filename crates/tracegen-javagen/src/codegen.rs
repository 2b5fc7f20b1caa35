//! Deterministic Java source renderer.
//!
//! Four-space indentation, one blank line between members, imports sorted
//! with static imports last. Rendering never fails: every name was validated
//! when the IR was built.

use crate::hir::*;
use std::fmt::Write as _;

const INDENT: &str = "    ";

/// Render a compilation unit to Java source text.
#[must_use]
pub fn render(unit: &CompilationUnit) -> String {
    let mut w = SourceWriter::default();

    if let Some(meta) = &unit.metadata {
        w.line(&format!(
            "// Generated by {} {} - DO NOT EDIT",
            meta.tool, meta.version
        ));
        w.line(&format!("// Input hash: {}", meta.input_hash));
        w.line(&format!("// Generated at: {}", meta.timestamp));
        w.line(&format!("// Regenerate with: {}", meta.regenerate_cmd));
        w.blank();
    }

    if let Some(package) = &unit.package {
        w.line(&format!("package {package};"));
        w.blank();
    }

    let mut imports = unit.imports.clone();
    imports.sort();
    imports.dedup();
    if !imports.is_empty() {
        for import in &imports {
            let keyword = if import.is_static { "import static" } else { "import" };
            let star = if import.wildcard { ".*" } else { "" };
            w.line(&format!("{keyword} {}{star};", import.path));
        }
        w.blank();
    }

    for (i, class) in unit.classes.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        render_class(&mut w, class);
    }

    w.finish()
}

#[derive(Default)]
struct SourceWriter {
    out: String,
    depth: usize,
}

impl SourceWriter {
    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn indent(&mut self) {
        self.depth += 1;
    }

    fn dedent(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn finish(self) -> String {
        self.out
    }
}

fn render_javadoc(w: &mut SourceWriter, text: &str) {
    w.line("/**");
    for line in text.lines() {
        if line.is_empty() {
            w.line(" *");
        } else {
            w.line(&format!(" * {}", line.replace("*/", "*&#47;")));
        }
    }
    w.line(" */");
}

fn render_annotation(annotation: &Annotation) -> String {
    match &annotation.value {
        Some(value) => format!("@{}({})", annotation.name, expr_to_string(value)),
        None => format!("@{}", annotation.name),
    }
}

fn modifier_prefix(modifiers: Modifiers) -> String {
    let mut parts = Vec::new();
    let vis = modifiers.visibility.as_str();
    if !vis.is_empty() {
        parts.push(vis);
    }
    if modifiers.is_static {
        parts.push("static");
    }
    if modifiers.is_final {
        parts.push("final");
    }
    let mut prefix = parts.join(" ");
    if !prefix.is_empty() {
        prefix.push(' ');
    }
    prefix
}

fn render_class(w: &mut SourceWriter, class: &JavaClass) {
    if let Some(doc) = &class.javadoc {
        render_javadoc(w, doc);
    }
    for annotation in &class.annotations {
        w.line(&render_annotation(annotation));
    }
    w.line(&format!(
        "{}class {} {{",
        modifier_prefix(class.modifiers),
        class.name
    ));
    w.indent();
    for (i, method) in class.methods.iter().enumerate() {
        if i > 0 {
            w.blank();
        }
        render_method(w, method);
    }
    w.dedent();
    w.line("}");
}

fn render_method(w: &mut SourceWriter, method: &JavaMethod) {
    if let Some(doc) = &method.javadoc {
        render_javadoc(w, doc);
    }
    for annotation in &method.annotations {
        w.line(&render_annotation(annotation));
    }

    let mut header = modifier_prefix(method.modifiers);
    if !method.type_params.is_empty() {
        let params: Vec<&str> = method.type_params.iter().map(Identifier::as_str).collect();
        let _ = write!(header, "<{}> ", params.join(", "));
    }
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty, p.name))
        .collect();
    let _ = write!(
        header,
        "{} {}({})",
        method.return_type,
        method.name,
        params.join(", ")
    );
    if !method.throws.is_empty() {
        let throws: Vec<&str> = method.throws.iter().map(TypeRef::as_str).collect();
        let _ = write!(header, " throws {}", throws.join(", "));
    }
    header.push_str(" {");
    w.line(&header);

    w.indent();
    render_block(w, &method.body);
    w.dedent();
    w.line("}");
}

fn render_block(w: &mut SourceWriter, stmts: &[Stmt]) {
    for stmt in stmts {
        render_stmt(w, stmt);
    }
}

fn render_stmt(w: &mut SourceWriter, stmt: &Stmt) {
    match stmt {
        Stmt::Local { ty, name, value } => {
            w.line(&format!("{ty} {name} = {};", expr_to_string(value)));
        }
        Stmt::Assign { target, value } => {
            w.line(&format!(
                "{} = {};",
                expr_to_string(target),
                expr_to_string(value)
            ));
        }
        Stmt::Expr(expr) => w.line(&format!("{};", expr_to_string(expr))),
        Stmt::Return(None) => w.line("return;"),
        Stmt::Return(Some(expr)) => w.line(&format!("return {};", expr_to_string(expr))),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
        } => {
            w.line(&format!("if ({}) {{", expr_to_string(condition)));
            w.indent();
            render_block(w, then_branch);
            w.dedent();
            if let Some(else_branch) = else_branch {
                w.line("} else {");
                w.indent();
                render_block(w, else_branch);
                w.dedent();
            }
            w.line("}");
        }
        Stmt::While { condition, body } => {
            w.line(&format!("while ({}) {{", expr_to_string(condition)));
            w.indent();
            render_block(w, body);
            w.dedent();
            w.line("}");
        }
        Stmt::TryCatch { body, catches } => {
            w.line("try {");
            w.indent();
            render_block(w, body);
            w.dedent();
            for clause in catches {
                w.line(&format!("}} catch ({} {}) {{", clause.exception, clause.var));
                w.indent();
                render_block(w, &clause.body);
                w.dedent();
            }
            w.line("}");
        }
        Stmt::Throw(expr) => w.line(&format!("throw {};", expr_to_string(expr))),
        Stmt::Comment(text) => {
            for line in text.lines() {
                w.line(&format!("// {line}"));
            }
        }
        Stmt::Blank => w.blank(),
    }
}

/// Render a single expression.
#[must_use]
pub fn expr_to_string(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, false);
    out
}

fn needs_parens(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary { .. } | Expr::Cast { .. } | Expr::Lambda { .. } | Expr::LambdaBlock { .. }
    )
}

fn write_expr(out: &mut String, expr: &Expr, nested: bool) {
    let parens = nested && needs_parens(expr);
    if parens {
        out.push('(');
    }
    match expr {
        Expr::Null => out.push_str("null"),
        Expr::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Expr::Int(v) => {
            let _ = write!(out, "{v}");
        }
        Expr::Long(v) => {
            let _ = write!(out, "{v}L");
        }
        Expr::Float(v) => out.push_str(&float_literal(*v)),
        Expr::Double(v) => out.push_str(&double_literal(*v)),
        Expr::Char(c) => out.push_str(&char_literal(*c)),
        Expr::Str(s) => out.push_str(&string_literal(s)),
        Expr::Ident(name) => out.push_str(name.as_str()),
        Expr::This => out.push_str("this"),
        Expr::Type(ty) => out.push_str(ty.as_str()),
        Expr::ClassLiteral(ty) => {
            let _ = write!(out, "{ty}.class");
        }
        Expr::Field { target, name } => {
            write_expr(out, target, true);
            let _ = write!(out, ".{name}");
        }
        Expr::Call {
            target,
            type_args,
            method,
            args,
        } => {
            if let Some(target) = target {
                write_expr(out, target, true);
                out.push('.');
            }
            if !type_args.is_empty() {
                let args: Vec<&str> = type_args.iter().map(TypeRef::as_str).collect();
                let _ = write!(out, "<{}>", args.join(", "));
            }
            out.push_str(method.as_str());
            write_args(out, args);
        }
        Expr::New { ty, args } => {
            let _ = write!(out, "new {ty}");
            write_args(out, args);
        }
        Expr::NewArray { element, items } => {
            let _ = write!(out, "new {element}[] {{");
            for (i, item) in items.iter().enumerate() {
                out.push_str(if i == 0 { " " } else { ", " });
                write_expr(out, item, false);
            }
            out.push_str(if items.is_empty() { "}" } else { " }" });
        }
        Expr::Cast { ty, expr } => {
            let _ = write!(out, "({ty}) ");
            write_expr(out, expr, true);
        }
        Expr::Binary { left, op, right } => {
            write_expr(out, left, true);
            let _ = write!(out, " {} ", op.as_str());
            write_expr(out, right, true);
        }
        Expr::Unary { op, operand } => {
            out.push_str(op.as_str());
            write_expr(out, operand, true);
        }
        Expr::Lambda { params, body } => {
            write_lambda_params(out, params);
            out.push_str(" -> ");
            write_expr(out, body, false);
        }
        Expr::LambdaBlock { params, body } => {
            write_lambda_params(out, params);
            out.push_str(" -> {");
            let mut w = SourceWriter::default();
            render_block(&mut w, body);
            let inner = w.finish();
            let stmts: Vec<&str> = inner.lines().map(str::trim).collect();
            for stmt in stmts.iter().filter(|s| !s.is_empty()) {
                let _ = write!(out, " {stmt}");
            }
            out.push_str(" }");
        }
    }
    if parens {
        out.push(')');
    }
}

fn write_args(out: &mut String, args: &[Expr]) {
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, arg, false);
    }
    out.push(')');
}

fn write_lambda_params(out: &mut String, params: &[Identifier]) {
    if params.len() == 1 {
        out.push_str(params[0].as_str());
    } else {
        let names: Vec<&str> = params.iter().map(Identifier::as_str).collect();
        let _ = write!(out, "({})", names.join(", "));
    }
}

/// Java `float` literal text for `v`.
#[must_use]
pub fn float_literal(v: f32) -> String {
    if v.is_nan() {
        "Float.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Float.POSITIVE_INFINITY".to_string()
        } else {
            "Float.NEGATIVE_INFINITY".to_string()
        }
    } else {
        format!("{v:?}f")
    }
}

/// Java `double` literal text for `v`.
#[must_use]
pub fn double_literal(v: f64) -> String {
    if v.is_nan() {
        "Double.NaN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "Double.POSITIVE_INFINITY".to_string()
        } else {
            "Double.NEGATIVE_INFINITY".to_string()
        }
    } else {
        format!("{v:?}")
    }
}

fn escape_char(c: char, quote: char, out: &mut String) {
    match c {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        '\u{8}' => out.push_str("\\b"),
        '\u{c}' => out.push_str("\\f"),
        c if c == quote => {
            out.push('\\');
            out.push(c);
        }
        // Octal escapes: unicode escapes are translated before lexing.
        c if c.is_control() && (c as u32) < 0x100 => {
            let _ = write!(out, "\\{:03o}", c as u32);
        }
        c if c.is_control() => {
            let _ = write!(out, "\\u{:04x}", c as u32);
        }
        c => out.push(c),
    }
}

/// Java string literal, quotes included.
#[must_use]
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        escape_char(c, '"', &mut out);
    }
    out.push('"');
    out
}

/// Java char literal, quotes included.
#[must_use]
pub fn char_literal(c: char) -> String {
    if (c as u32) > 0xFFFF {
        // Not representable as a single UTF-16 unit.
        return format!("(char) {}", c as u32 & 0xFFFF);
    }
    let mut out = String::from("'");
    escape_char(c, '\'', &mut out);
    out.push('\'');
    out
}

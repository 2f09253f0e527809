/// Host imports a module may need.
pub(crate) const READ_IMPORT: &str = r#"(func $read_i32 (import "" "read_i32") (result i32))"#;
pub(crate) const WRITE_IMPORT: &str = r#"(func $write_i32 (import "" "write_i32") (param i32))"#;

/// Line-oriented writer for the module text.
///
/// Everything after the imports is appended in emission order. Imports must
/// precede every definition in the text format, so they are only placed when
/// the module is finished and it is known whether `READ`/`WRITE` occurred.
pub(crate) struct Emitter {
    lines: Vec<String>,
    indent: usize,
    uses_read: bool,
    uses_write: bool,
}

impl Emitter {
    pub(crate) fn new() -> Self {
        Self {
            lines: Vec::new(),
            indent: 2,
            uses_read: false,
            uses_write: false,
        }
    }

    pub(crate) fn line(&mut self, s: impl Into<String>) {
        let s = s.into();
        if s.is_empty() {
            self.lines.push(s);
        } else {
            self.lines.push(format!("{}{}", " ".repeat(self.indent), s));
        }
    }

    pub(crate) fn blank(&mut self) {
        self.lines.push(String::new());
    }

    pub(crate) fn indent(&mut self) {
        self.indent += 2;
    }

    pub(crate) fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(2);
    }

    pub(crate) fn call_read(&mut self) {
        self.uses_read = true;
        self.line("call $read_i32");
    }

    pub(crate) fn call_write(&mut self) {
        self.uses_write = true;
        self.line("call $write_i32");
    }

    pub(crate) fn finish(self) -> String {
        let mut text = String::from("(module\n");
        if self.uses_read {
            text.push_str("  ");
            text.push_str(READ_IMPORT);
            text.push('\n');
        }
        if self.uses_write {
            text.push_str("  ");
            text.push_str(WRITE_IMPORT);
            text.push('\n');
        }
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(")\n");
        text
    }
}

//! Code emission: label allocation, instruction emission, subroutine
//! framing, the string pool, and final textual serialization to a `.j`
//! (Jasmin-style) assembly file.
//!
//! One subroutine is "open" at a time; its instructions accumulate in
//! `current`. `close_subroutine` freezes it (with its recorded frame width)
//! into `subroutines`, which is the ordered list that becomes the final
//! output.

use crate::error::CompileError;
use crate::symtab::IdProp;
use crate::types::ValType;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

/// An integer comparison, used by [`Emitter::emit_cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cond {
    fn jasmin_if(self) -> &'static str {
        match self {
            Cond::Eq => "if_icmpeq",
            Cond::Ne => "if_icmpne",
            Cond::Lt => "if_icmplt",
            Cond::Le => "if_icmple",
            Cond::Gt => "if_icmpgt",
            Cond::Ge => "if_icmpge",
        }
    }
}

#[derive(Debug)]
struct SubroutineFrame {
    name: String,
    params: Vec<ValType>,
    return_type: ValType,
    locals_width: u32,
    body: String,
}

#[derive(Debug)]
pub struct Emitter {
    class_name: String,
    subroutines: Vec<SubroutineFrame>,
    current: Option<(String, Vec<ValType>, ValType, String)>,
    label_counter: u32,
    string_pool: HashMap<String, String>,
    string_counter: u32,
}

impl Emitter {
    pub fn new(class_name: &str) -> Self {
        Emitter {
            class_name: class_name.to_string(),
            subroutines: Vec::new(),
            current: None,
            label_counter: 0,
            string_pool: HashMap::new(),
            string_counter: 0,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// A fresh, never-before-returned label.
    pub fn get_label(&mut self) -> String {
        let label = format!("L{}", self.label_counter);
        self.label_counter += 1;
        label
    }

    fn body_mut(&mut self) -> &mut String {
        &mut self.current.as_mut().expect("no subroutine open").3
    }

    /// Appends one instruction line, e.g. `emit("iload", Some("1"))`.
    pub fn emit(&mut self, op: &str, arg: Option<&str>) {
        let body = self.body_mut();
        match arg {
            Some(a) => writeln!(body, "    {} {}", op, a).unwrap(),
            None => writeln!(body, "    {}", op).unwrap(),
        }
    }

    pub fn emit_label(&mut self, label: &str) {
        let body = self.body_mut();
        writeln!(body, "  {}:", label).unwrap();
    }

    /// Lowers an integer comparison to a branch-and-push-0-or-1 sequence
    /// leaving a single value on the stack. No short-circuiting anywhere
    /// near this — the operands are already on the stack when this runs.
    pub fn emit_cmp(&mut self, cond: Cond) {
        let true_label = self.get_label();
        let end_label = self.get_label();
        self.emit(cond.jasmin_if(), Some(&true_label));
        self.emit("iconst_0", None);
        self.emit("goto", Some(&end_label));
        self.emit_label(&true_label);
        self.emit("iconst_1", None);
        self.emit_label(&end_label);
    }

    /// Allocates a 1-D array of `element` whose length is on top of stack.
    pub fn emit_newarray(&mut self, element: ValType) {
        if element.is_boolean() {
            self.emit("newarray", Some("boolean"));
        } else {
            self.emit("newarray", Some("int"));
        }
    }

    /// Emits a call honoring the callee's parameter list and return kind.
    pub fn emit_call(&mut self, name: &str, props: &IdProp) {
        let descriptor = jvm_descriptor(&props.params, props.val_type.strip_callable());
        self.emit(
            "invokestatic",
            Some(&format!("{}/{}{}", self.class_name, name, descriptor)),
        );
    }

    /// Runtime support class providing the handful of I/O primitives the
    /// JVM has no bytecode for (reading a line, parsing it). Emitted SIMPL
    /// programs are linked against this class exactly as emitted code from
    /// the teacher's pipeline links against its external runtime library —
    /// the companion assembler and this class are both out of the core's
    /// scope (spec §1).
    const RUNTIME_CLASS: &'static str = "SimplRuntime";

    pub fn emit_print(&mut self, ty: ValType) {
        let descriptor = if ty.is_boolean() { "(Z)V" } else { "(I)V" };
        // Stack has the value on top; fetch System.out, then swap it under
        // the value so invokevirtual sees (receiver, arg).
        self.emit("getstatic", Some("java/lang/System/out Ljava/io/PrintStream;"));
        self.emit("swap", None);
        self.emit(
            "invokevirtual",
            Some(&format!("java/io/PrintStream/println{}", descriptor)),
        );
    }

    pub fn emit_print_string(&mut self, s: &str) {
        let escaped = self.intern_string(s);
        self.emit("getstatic", Some("java/lang/System/out Ljava/io/PrintStream;"));
        self.emit("ldc", Some(&format!("\"{}\"", escaped)));
        self.emit(
            "invokevirtual",
            Some("java/io/PrintStream/println(Ljava/lang/String;)V"),
        );
    }

    pub fn emit_read(&mut self, ty: ValType) {
        let descriptor = if ty.is_boolean() { "()Z" } else { "()I" };
        self.emit(
            "invokestatic",
            Some(&format!("{}/read{}", Self::RUNTIME_CLASS, descriptor)),
        );
    }

    /// Interns a string literal, returning a pool key used to reference it.
    /// Deduplicates identical contents.
    pub fn intern_string(&mut self, s: &str) -> String {
        if let Some(existing) = self.string_pool.get(s) {
            return existing.clone();
        }
        let escaped = escape_jasmin_string(s);
        self.string_pool.insert(s.to_string(), escaped.clone());
        self.string_counter += 1;
        escaped
    }

    /// Opens a new subroutine frame. Must be balanced by `close_subroutine`.
    pub fn init_subroutine(&mut self, name: &str, params: Vec<ValType>, return_type: ValType) {
        assert!(self.current.is_none(), "a subroutine is already open");
        self.current = Some((name.to_string(), params, return_type, String::new()));
    }

    /// Closes the currently open subroutine, recording its frame width.
    pub fn close_subroutine(&mut self, locals_width: u32) {
        let (name, params, return_type, body) =
            self.current.take().expect("no subroutine open to close");
        self.subroutines.push(SubroutineFrame {
            name,
            params,
            return_type,
            locals_width,
            body,
        });
    }

    /// Serializes the full textual program and writes it to `<ClassName>.j`
    /// in `dir`. Returns the path written.
    pub fn serialize(&self, dir: &Path) -> Result<std::path::PathBuf, CompileError> {
        let mut out = String::new();
        writeln!(out, ".class public {}", self.class_name).unwrap();
        writeln!(out, ".super java/lang/Object").unwrap();
        writeln!(out).unwrap();
        writeln!(out, ".method public <init>()V").unwrap();
        writeln!(out, "    aload_0").unwrap();
        writeln!(out, "    invokespecial java/lang/Object/<init>()V").unwrap();
        writeln!(out, "    return").unwrap();
        writeln!(out, ".end method").unwrap();
        writeln!(out).unwrap();

        for sub in &self.subroutines {
            let descriptor = jvm_descriptor(&sub.params, sub.return_type.strip_callable());
            let is_main = sub.name == "main";
            if is_main {
                writeln!(out, ".method public static main([Ljava/lang/String;)V").unwrap();
            } else {
                writeln!(out, ".method public static {}{}", sub.name, descriptor).unwrap();
            }
            writeln!(out, "    .limit stack 64").unwrap();
            writeln!(out, "    .limit locals {}", sub.locals_width.max(1)).unwrap();
            out.push_str(&sub.body);
            writeln!(out, ".end method").unwrap();
            writeln!(out).unwrap();
        }

        let path = dir.join(format!("{}.j", self.class_name));
        std::fs::write(&path, out).map_err(|source| CompileError::CannotWriteOutput {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// A single scalar or array JVM type letter for a SIMPL value type.
fn jvm_type_letter(ty: ValType) -> &'static str {
    if ty.is_array() {
        if ty.is_boolean() {
            "[Z"
        } else {
            "[I"
        }
    } else if ty.is_boolean() {
        "Z"
    } else {
        "I"
    }
}

/// Builds a JVM method descriptor, e.g. `(II)Z`, from a parameter list and
/// an optional return type (empty return type means `void`).
fn jvm_descriptor(params: &[ValType], return_type: ValType) -> String {
    let mut desc = String::from("(");
    for p in params {
        desc.push_str(jvm_type_letter(*p));
    }
    desc.push(')');
    if return_type == ValType::empty() {
        desc.push('V');
    } else {
        desc.push_str(jvm_type_letter(return_type));
    }
    desc
}

fn escape_jasmin_string(s: &str) -> String {
    let mut out = String::new();
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_fresh() {
        let mut e = Emitter::new("T");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            assert!(seen.insert(e.get_label()));
        }
    }

    #[test]
    fn descriptor_for_void_procedure() {
        assert_eq!(jvm_descriptor(&[ValType::INTEGER], ValType::empty()), "(I)V");
    }

    #[test]
    fn descriptor_for_boolean_function() {
        assert_eq!(
            jvm_descriptor(&[ValType::INTEGER, ValType::BOOLEAN], ValType::BOOLEAN),
            "(IZ)Z"
        );
    }

    #[test]
    fn array_descriptor() {
        let arr = ValType::INTEGER | ValType::ARRAY;
        assert_eq!(jvm_type_letter(arr), "[I");
    }

    #[test]
    fn subroutine_body_contains_emitted_instructions() {
        let mut e = Emitter::new("T");
        e.init_subroutine("main", vec![], ValType::empty());
        e.emit("iconst_1", None);
        e.emit("iconst_0", None);
        e.emit_cmp(Cond::Eq);
        e.emit("return", None);
        e.close_subroutine(1);
        let dir = tempfile_dir();
        let path = e.serialize(&dir).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("if_icmpeq"));
        assert!(text.contains(".method public static main"));
    }

    #[test]
    fn string_pool_deduplicates() {
        let mut e = Emitter::new("T");
        let a = e.intern_string("hello");
        let b = e.intern_string("hello");
        assert_eq!(a, b);
    }

    fn tempfile_dir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("simplc-emitter-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}

//! The recursive-descent parser.
//!
//! Per spec §3, this is a deliberate departure from the teacher's own
//! AST-then-lower pipeline (`compiler/src/ast.rs` + `compiler/src/codegen.rs`):
//! there is no persistent tree. Each production is a function that consumes
//! tokens, threads its synthesized type back up through its return value,
//! and emits instructions as it goes. One token of lookahead (`self.current`)
//! is all the grammar needs.

use crate::config::Config;
use crate::emitter::{Cond, Emitter};
use crate::error::{CompileError, CompileResult};
use crate::lexer::Lexer;
use crate::source_pos::SourcePos;
use crate::symtab::{IdProp, SymbolTable};
use crate::token::{Token, TokenKind};
use crate::types::ValType;

/// What an enclosing subroutine's `exit` statement must satisfy. `Procedure`
/// bodies (including the implicit top-level `main`) reject an exit
/// expression outright; `Function` bodies require one whose type matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnKind {
    Procedure,
    Function(ValType),
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    symtab: SymbolTable,
    emitter: Emitter,
    return_kind: ReturnKind,
}

/// Compiles `source` to a completed [`Emitter`] ready for `serialize`,
/// along with the class name declared by the program's `program` clause.
pub fn compile(source: &str, config: &Config) -> CompileResult<(String, Emitter)> {
    let mut parser = Parser::new(source, config)?;
    parser.parse_program()?;
    let class_name = parser.emitter.class_name().to_string();
    Ok((class_name, parser.emitter))
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, config: &Config) -> CompileResult<Self> {
        let mut lexer = Lexer::with_max_id_length(source, config.max_id_length);
        let current = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current,
            symtab: SymbolTable::new(),
            emitter: Emitter::new("Main"),
            return_kind: ReturnKind::Procedure,
        })
    }

    fn advance(&mut self) -> CompileResult<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: TokenKind, desc: &str) -> CompileResult<SourcePos> {
        if self.check(&kind) {
            let pos = self.current.pos;
            self.advance()?;
            Ok(pos)
        } else {
            Err(CompileError::ExpectedButFound {
                pos: self.current.pos,
                expected: desc.to_string(),
                found: self.current.kind.to_string(),
            })
        }
    }

    fn expect_id(&mut self) -> CompileResult<(String, SourcePos)> {
        match self.current.kind.clone() {
            TokenKind::Id(name) => {
                let pos = self.current.pos;
                self.advance()?;
                Ok((name, pos))
            }
            other => Err(CompileError::ExpectedButFound {
                pos: self.current.pos,
                expected: "identifier".to_string(),
                found: other.to_string(),
            }),
        }
    }

    fn check_type(
        &self,
        found: ValType,
        expected: ValType,
        pos: SourcePos,
        context: &str,
    ) -> CompileResult<()> {
        if found == expected {
            Ok(())
        } else {
            Err(CompileError::IncompatibleTypes {
                pos,
                expected,
                found,
                context: context.to_string(),
            })
        }
    }

    // --- program ---

    fn parse_program(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Program, "'program'")?;
        let (name, _) = self.expect_id()?;
        self.emitter = Emitter::new(&name);

        while self.check(&TokenKind::Define) {
            self.parse_funcdef()?;
        }

        self.emitter.init_subroutine("main", Vec::new(), ValType::empty());
        self.symtab.open_main_scope();
        self.return_kind = ReturnKind::Procedure;
        self.parse_body()?;
        self.emitter.emit("return", None);
        self.emitter.close_subroutine(self.symtab.locals_width());
        self.symtab.close_subroutine();

        self.expect(TokenKind::Eof, "end of file")?;
        Ok(())
    }

    // --- funcdef ---

    fn parse_funcdef(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Define, "'define'")?;
        let (name, name_pos) = self.expect_id()?;
        self.expect(TokenKind::LParen, "'('")?;

        let mut params: Vec<(String, SourcePos, ValType)> = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (pname, ppos) = self.expect_id()?;
                params.push((pname, ppos, ty));
                if self.check(&TokenKind::Comma) {
                    self.advance()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        let return_type = if self.check(&TokenKind::Arrow) {
            self.advance()?;
            Some(self.parse_type()?)
        } else {
            None
        };

        let callable_type = ValType::CALLABLE | return_type.unwrap_or(ValType::empty());
        let param_types: Vec<ValType> = params.iter().map(|(_, _, t)| *t).collect();
        let props = IdProp::callable(callable_type, param_types.clone());

        self.symtab
            .open_subroutine(&name, props.clone())
            .map_err(|_| CompileError::MultipleDefinition {
                pos: name_pos,
                name: name.clone(),
            })?;
        self.emitter
            .init_subroutine(&name, param_types, return_type.unwrap_or(ValType::empty()));

        for (pname, ppos, pty) in &params {
            self.symtab
                .insert(pname, IdProp::variable(*pty, 0))
                .map_err(|_| CompileError::MultipleDefinition {
                    pos: *ppos,
                    name: pname.clone(),
                })?;
        }

        let saved_return_kind = self.return_kind;
        self.return_kind = match return_type {
            Some(t) => ReturnKind::Function(t),
            None => ReturnKind::Procedure,
        };

        self.parse_body()?;

        // A procedure body falls off the end without an explicit exit.
        if matches!(self.return_kind, ReturnKind::Procedure) {
            self.emitter.emit("return", None);
        }

        self.emitter.close_subroutine(self.symtab.locals_width());
        self.symtab.close_subroutine();
        self.return_kind = saved_return_kind;
        Ok(())
    }

    // --- body, statements, vardef, type ---

    fn parse_body(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Begin, "'begin'")?;
        while self.check(&TokenKind::Boolean) || self.check(&TokenKind::Integer) {
            self.parse_vardef()?;
        }
        self.parse_statements()?;
        self.expect(TokenKind::End, "'end'")?;
        Ok(())
    }

    fn parse_vardef(&mut self) -> CompileResult<()> {
        let ty = self.parse_type()?;
        loop {
            let (name, pos) = self.expect_id()?;
            self.symtab
                .insert(&name, IdProp::variable(ty, 0))
                .map_err(|_| CompileError::MultipleDefinition { pos, name })?;
            if self.check(&TokenKind::Comma) {
                self.advance()?;
                continue;
            }
            break;
        }
        self.expect(TokenKind::Semi, "';'")?;
        Ok(())
    }

    fn parse_type(&mut self) -> CompileResult<ValType> {
        let base = if self.check(&TokenKind::Boolean) {
            self.advance()?;
            ValType::BOOLEAN
        } else if self.check(&TokenKind::Integer) {
            self.advance()?;
            ValType::INTEGER
        } else {
            return Err(CompileError::TypeExpected {
                pos: self.current.pos,
            });
        };
        if self.check(&TokenKind::Array) {
            self.advance()?;
            Ok(base | ValType::ARRAY)
        } else {
            Ok(base)
        }
    }

    fn parse_statements(&mut self) -> CompileResult<()> {
        if self.check(&TokenKind::Chill) {
            self.advance()?;
            return Ok(());
        }
        self.parse_statement()?;
        while self.check(&TokenKind::Semi) {
            self.advance()?;
            self.parse_statement()?;
        }
        Ok(())
    }

    fn parse_statement(&mut self) -> CompileResult<()> {
        match &self.current.kind {
            TokenKind::Exit => self.parse_exit(),
            TokenKind::If => self.parse_if(),
            TokenKind::Id(_) => self.parse_name(),
            TokenKind::Read => self.parse_read(),
            TokenKind::While => self.parse_while(),
            TokenKind::Write => self.parse_write(),
            _ => Err(CompileError::StatementExpected {
                pos: self.current.pos,
            }),
        }
    }

    // --- exit ---

    fn parse_exit(&mut self) -> CompileResult<()> {
        let pos = self.current.pos;
        self.expect(TokenKind::Exit, "'exit'")?;
        match self.return_kind {
            ReturnKind::Procedure => {
                if starts_expr(&self.current.kind) {
                    return Err(CompileError::ExitExpressionInProcedure { pos: self.current.pos });
                }
                self.emitter.emit("return", None);
            }
            ReturnKind::Function(base) => {
                if !starts_expr(&self.current.kind) {
                    return Err(CompileError::MissingExitExpression { pos });
                }
                let expr_pos = self.current.pos;
                let found = self.parse_expr()?;
                self.check_type(found, base, expr_pos, "'exit' statement")?;
                if base.is_array() {
                    self.emitter.emit("areturn", None);
                } else {
                    self.emitter.emit("ireturn", None);
                }
            }
        }
        Ok(())
    }

    // --- if ---

    fn parse_if(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::If, "'if'")?;
        let end_label = self.emitter.get_label();
        loop {
            let guard_pos = self.current.pos;
            let guard_ty = self.parse_expr()?;
            self.check_type(guard_ty, ValType::BOOLEAN, guard_pos, "'if' guard")?;
            let next_label = self.emitter.get_label();
            self.emitter.emit("ifeq", Some(&next_label));
            self.expect(TokenKind::Then, "'then'")?;
            self.parse_statements()?;
            self.emitter.emit("goto", Some(&end_label));
            self.emitter.emit_label(&next_label);
            if self.check(&TokenKind::Elsif) {
                self.advance()?;
                continue;
            }
            break;
        }
        if self.check(&TokenKind::Else) {
            self.advance()?;
            self.parse_statements()?;
        }
        self.expect(TokenKind::End, "'end'")?;
        self.emitter.emit_label(&end_label);
        Ok(())
    }

    // --- while ---

    fn parse_while(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::While, "'while'")?;
        let head_label = self.emitter.get_label();
        self.emitter.emit_label(&head_label);
        let guard_pos = self.current.pos;
        let guard_ty = self.parse_expr()?;
        self.check_type(guard_ty, ValType::BOOLEAN, guard_pos, "'while' guard")?;
        let exit_label = self.emitter.get_label();
        self.emitter.emit("ifeq", Some(&exit_label));
        self.expect(TokenKind::Do, "'do'")?;
        self.parse_statements()?;
        self.expect(TokenKind::End, "'end'")?;
        self.emitter.emit("goto", Some(&head_label));
        self.emitter.emit_label(&exit_label);
        Ok(())
    }

    // --- write ---

    fn parse_write(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Write, "'write'")?;
        self.parse_write_item()?;
        while self.check(&TokenKind::Amp) {
            self.advance()?;
            self.parse_write_item()?;
        }
        Ok(())
    }

    fn parse_write_item(&mut self) -> CompileResult<()> {
        if let TokenKind::Str(s) = self.current.kind.clone() {
            self.emitter.emit_print_string(&s);
            self.advance()?;
            return Ok(());
        }
        if !starts_expr(&self.current.kind) {
            return Err(CompileError::ExpressionOrStringExpected {
                pos: self.current.pos,
            });
        }
        let pos = self.current.pos;
        let ty = self.parse_expr()?;
        if ty.is_array() {
            return Err(CompileError::IllegalArrayOperation {
                pos,
                op: "write".to_string(),
            });
        }
        self.emitter.emit_print(ty);
        Ok(())
    }

    // --- read ---

    fn parse_read(&mut self) -> CompileResult<()> {
        self.expect(TokenKind::Read, "'read'")?;
        let (name, pos) = self.expect_id()?;
        let props = self
            .symtab
            .find(&name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownIdentifier { pos, name: name.clone() })?;
        if !props.val_type.is_variable() {
            return Err(CompileError::NotAVariable { pos, name });
        }
        if self.check(&TokenKind::LBracket) {
            if !props.val_type.is_array() {
                return Err(CompileError::NotAnArray { pos, name });
            }
            self.emitter.emit("aload", Some(&props.offset.to_string()));
            let idx_ty = self.parse_index()?;
            self.check_type(idx_ty, ValType::INTEGER, pos, "array index")?;
            let elem = props.val_type.element_type();
            self.emitter.emit_read(elem);
            self.emitter.emit(elem_store_op(elem), None);
        } else {
            if props.val_type.is_array() {
                return Err(CompileError::ScalarVariableExpected { pos });
            }
            self.emitter.emit_read(props.val_type);
            self.emitter
                .emit("istore", Some(&props.offset.to_string()));
        }
        Ok(())
    }

    fn parse_index(&mut self) -> CompileResult<ValType> {
        self.expect(TokenKind::LBracket, "'['")?;
        let pos = self.current.pos;
        let ty = self.parse_simple()?;
        self.check_type(ty, ValType::INTEGER, pos, "array index")?;
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(ty)
    }

    // --- name: assignment or procedure call ---

    fn parse_name(&mut self) -> CompileResult<()> {
        let (name, pos) = self.expect_id()?;
        let props = self
            .symtab
            .find(&name)
            .cloned()
            .ok_or_else(|| CompileError::UnknownIdentifier { pos, name: name.clone() })?;

        if self.check(&TokenKind::LParen) {
            if !props.val_type.is_procedure() {
                return Err(CompileError::NotAProcedure { pos, name });
            }
            self.parse_arglist(&name, pos, &props)?;
            return Ok(());
        }

        if !props.val_type.is_variable() {
            return Err(CompileError::NotAVariable { pos, name });
        }

        if self.check(&TokenKind::LBracket) {
            if !props.val_type.is_array() {
                return Err(CompileError::NotAnArray { pos, name });
            }
            self.emitter.emit("aload", Some(&props.offset.to_string()));
            self.parse_index()?;
            self.expect(TokenKind::Assign, "'<-'")?;
            let rhs_pos = self.current.pos;
            let rhs = self.parse_expr()?;
            let elem = props.val_type.element_type();
            self.check_type(rhs, elem, rhs_pos, &format!("assignment to '{}'", name))?;
            self.emitter.emit(elem_store_op(elem), None);
            return Ok(());
        }

        self.expect(TokenKind::Assign, "'<-'")?;

        if props.val_type.is_array() && self.check(&TokenKind::Array) {
            self.advance()?;
            let size_pos = self.current.pos;
            let size_ty = self.parse_simple()?;
            self.check_type(size_ty, ValType::INTEGER, size_pos, "array size")?;
            self.emitter.emit_newarray(props.val_type.element_type());
            self.emitter.emit("astore", Some(&props.offset.to_string()));
            return Ok(());
        }

        let rhs_pos = self.current.pos;
        let rhs = self.parse_expr()?;
        self.check_type(rhs, props.val_type, rhs_pos, &format!("assignment to '{}'", name))?;
        let store_op = if props.val_type.is_array() { "astore" } else { "istore" };
        self.emitter.emit(store_op, Some(&props.offset.to_string()));
        Ok(())
    }

    // --- arglist ---

    fn parse_arglist(&mut self, name: &str, pos: SourcePos, props: &IdProp) -> CompileResult<ValType> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut arg_types = Vec::new();
        let mut arg_positions = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let apos = self.current.pos;
                let ty = self.parse_expr()?;
                arg_types.push(ty);
                arg_positions.push(apos);
                if self.check(&TokenKind::Comma) {
                    self.advance()?;
                    continue;
                }
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;

        if arg_types.len() > props.nparams {
            return Err(CompileError::TooManyArguments {
                pos,
                name: name.to_string(),
            });
        }
        if arg_types.len() < props.nparams {
            return Err(CompileError::TooFewArguments {
                pos,
                name: name.to_string(),
            });
        }
        for (i, (found, apos)) in arg_types.iter().zip(arg_positions.iter()).enumerate() {
            self.check_type(
                *found,
                props.params[i],
                *apos,
                &format!("argument {} of call to '{}'", i + 1, name),
            )?;
        }
        self.emitter.emit_call(name, props);
        Ok(props.val_type.strip_callable())
    }

    // --- expr / simple / term / factor ---

    fn parse_expr(&mut self) -> CompileResult<ValType> {
        let pos = self.current.pos;
        let lhs = self.parse_simple()?;
        let cond = match self.current.kind {
            TokenKind::Eq => Some((Cond::Eq, false)),
            TokenKind::Hash => Some((Cond::Ne, false)),
            TokenKind::Lt => Some((Cond::Lt, true)),
            TokenKind::Le => Some((Cond::Le, true)),
            TokenKind::Gt => Some((Cond::Gt, true)),
            TokenKind::Ge => Some((Cond::Ge, true)),
            _ => None,
        };
        let (cond, order) = match cond {
            Some(c) => c,
            None => return Ok(lhs),
        };
        self.advance()?;
        let rhs_pos = self.current.pos;
        let rhs = self.parse_simple()?;
        if lhs.is_array() || rhs.is_array() {
            return Err(CompileError::IllegalArrayOperation {
                pos,
                op: "relational".to_string(),
            });
        }
        self.check_type(rhs, lhs, rhs_pos, "relational operator")?;
        if order && !lhs.is_integer() {
            return Err(CompileError::IncompatibleTypes {
                pos,
                expected: ValType::INTEGER,
                found: lhs,
                context: "relational operator".to_string(),
            });
        }
        self.emitter.emit_cmp(cond);
        Ok(ValType::BOOLEAN)
    }

    fn parse_simple(&mut self) -> CompileResult<ValType> {
        let neg = self.check(&TokenKind::Minus);
        let neg_pos = self.current.pos;
        if neg {
            self.advance()?;
        }
        let mut t = self.parse_term()?;
        if neg {
            if t.is_array() {
                return Err(CompileError::IllegalArrayOperation {
                    pos: neg_pos,
                    op: "unary '-'".to_string(),
                });
            }
            self.check_type(t, ValType::INTEGER, neg_pos, "unary '-' operator")?;
            self.emitter.emit("ineg", None);
        }
        loop {
            let (expected, jasmin_op, label) = match self.current.kind {
                TokenKind::Plus => (ValType::INTEGER, "iadd", "'+' operator"),
                TokenKind::Minus => (ValType::INTEGER, "isub", "'-' operator"),
                TokenKind::Or => (ValType::BOOLEAN, "ior", "'or' operator"),
                _ => break,
            };
            let op_pos = self.current.pos;
            self.advance()?;
            if t.is_array() {
                return Err(CompileError::IllegalArrayOperation {
                    pos: op_pos,
                    op: label.to_string(),
                });
            }
            self.check_type(t, expected, op_pos, label)?;
            let rhs_pos = self.current.pos;
            let rhs = self.parse_term()?;
            if rhs.is_array() {
                return Err(CompileError::IllegalArrayOperation {
                    pos: rhs_pos,
                    op: label.to_string(),
                });
            }
            self.check_type(rhs, expected, rhs_pos, label)?;
            self.emitter.emit(jasmin_op, None);
            t = expected;
        }
        Ok(t)
    }

    fn parse_term(&mut self) -> CompileResult<ValType> {
        let mut t = self.parse_factor()?;
        loop {
            let (expected, jasmin_op, label) = match self.current.kind {
                TokenKind::Star => (ValType::INTEGER, "imul", "'*' operator"),
                TokenKind::Slash => (ValType::INTEGER, "idiv", "'/' operator"),
                TokenKind::Mod => (ValType::INTEGER, "irem", "'mod' operator"),
                TokenKind::And => (ValType::BOOLEAN, "iand", "'and' operator"),
                _ => break,
            };
            let op_pos = self.current.pos;
            self.advance()?;
            if t.is_array() {
                return Err(CompileError::IllegalArrayOperation {
                    pos: op_pos,
                    op: label.to_string(),
                });
            }
            self.check_type(t, expected, op_pos, label)?;
            let rhs_pos = self.current.pos;
            let rhs = self.parse_factor()?;
            if rhs.is_array() {
                return Err(CompileError::IllegalArrayOperation {
                    pos: rhs_pos,
                    op: label.to_string(),
                });
            }
            self.check_type(rhs, expected, rhs_pos, label)?;
            self.emitter.emit(jasmin_op, None);
            t = expected;
        }
        Ok(t)
    }

    fn parse_factor(&mut self) -> CompileResult<ValType> {
        match self.current.kind.clone() {
            TokenKind::Id(name) => {
                let pos = self.current.pos;
                self.advance()?;
                let props = self
                    .symtab
                    .find(&name)
                    .cloned()
                    .ok_or_else(|| CompileError::UnknownIdentifier { pos, name: name.clone() })?;

                if self.check(&TokenKind::LParen) {
                    if !props.val_type.is_function() {
                        return Err(CompileError::NotAFunction { pos, name });
                    }
                    return self.parse_arglist(&name, pos, &props);
                }

                if self.check(&TokenKind::LBracket) {
                    if !props.val_type.is_array() {
                        return Err(CompileError::NotAnArray { pos, name });
                    }
                    self.emitter.emit("aload", Some(&props.offset.to_string()));
                    self.parse_index()?;
                    let elem = props.val_type.element_type();
                    self.emitter.emit(elem_load_op(elem), None);
                    return Ok(elem);
                }

                if props.val_type.is_function() {
                    return Err(CompileError::MissingArgumentList { pos, name });
                }
                if !props.val_type.is_variable() {
                    return Err(CompileError::NotAVariable { pos, name });
                }
                if props.val_type.is_array() {
                    self.emitter.emit("aload", Some(&props.offset.to_string()));
                } else {
                    self.emitter.emit("iload", Some(&props.offset.to_string()));
                }
                Ok(props.val_type)
            }
            TokenKind::Num(n) => {
                self.advance()?;
                self.emitter.emit("ldc", Some(&n.to_string()));
                Ok(ValType::INTEGER)
            }
            TokenKind::Not => {
                let pos = self.current.pos;
                self.advance()?;
                let t = self.parse_factor()?;
                self.check_type(t, ValType::BOOLEAN, pos, "'not' operator")?;
                self.emitter.emit("iconst_1", None);
                self.emitter.emit("ixor", None);
                Ok(ValType::BOOLEAN)
            }
            TokenKind::True => {
                self.advance()?;
                self.emitter.emit("iconst_1", None);
                Ok(ValType::BOOLEAN)
            }
            TokenKind::False => {
                self.advance()?;
                self.emitter.emit("iconst_0", None);
                Ok(ValType::BOOLEAN)
            }
            TokenKind::LParen => {
                self.advance()?;
                let t = self.parse_expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(t)
            }
            _ => Err(CompileError::FactorExpected {
                pos: self.current.pos,
            }),
        }
    }
}

/// The FIRST set of `expr` (equivalently `simple`), used to decide whether
/// an optional expression is present (`exit`, `write`'s string-or-expr
/// alternative) without committing to a parse.
fn starts_expr(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Minus
            | TokenKind::Id(_)
            | TokenKind::Num(_)
            | TokenKind::Not
            | TokenKind::True
            | TokenKind::False
            | TokenKind::LParen
    )
}

fn elem_store_op(elem: ValType) -> &'static str {
    if elem.is_boolean() {
        "bastore"
    } else {
        "iastore"
    }
}

fn elem_load_op(elem: ValType) -> &'static str {
    if elem.is_boolean() {
        "baload"
    } else {
        "iaload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(src: &str) -> Emitter {
        let config = Config::new();
        match compile(src, &config) {
            Ok((_, emitter)) => emitter,
            Err(e) => panic!("expected success, got {}", e),
        }
    }

    fn compile_err(src: &str) -> CompileError {
        let config = Config::new();
        compile(src, &config).unwrap_err()
    }

    fn serialized(emitter: &Emitter) -> String {
        let dir = std::env::temp_dir().join(format!("simplc-parser-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = emitter.serialize(&dir).unwrap();
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn hello_program_compiles() {
        let emitter = compile_ok(r#"program Hello begin write "hello" end"#);
        let text = serialized(&emitter);
        assert!(text.contains(".method public static main"));
        assert!(text.contains("invokevirtual java/io/PrintStream/println"));
    }

    #[test]
    fn duplicate_variable_is_fatal() {
        let err = compile_err("program P begin integer x, x; chill end");
        assert!(matches!(err, CompileError::MultipleDefinition { .. }));
    }

    #[test]
    fn array_write_is_rejected() {
        let err = compile_err(
            r#"program P begin integer array a; a <- array 3; write a end"#,
        );
        match err {
            CompileError::IllegalArrayOperation { op, .. } => assert_eq!(op, "write"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn function_return_type_mismatch_is_fatal() {
        let err = compile_err(
            "program P define f() -> boolean begin exit 1 end begin chill end",
        );
        assert!(matches!(err, CompileError::IncompatibleTypes { .. }));
    }

    #[test]
    fn call_arity_mismatch_is_fatal() {
        let err = compile_err(
            "program P define f(integer x) begin exit end begin f(1, 2) end",
        );
        assert!(matches!(err, CompileError::TooManyArguments { .. }));
    }

    #[test]
    fn and_or_never_short_circuit() {
        // Both operands of `and`/`or` must be fully evaluated and pushed
        // before the operator executes -- there is no branch-based shortcut
        // anywhere in this lowering, just iand/ior over two already-pushed
        // values.
        let emitter = compile_ok("program P begin boolean b; b <- true and false end");
        let text = serialized(&emitter);
        assert!(text.contains("iand"));
        assert!(!text.contains("ifeq"));
    }

    #[test]
    fn while_loop_emits_head_and_exit_labels() {
        let emitter = compile_ok(
            "program P begin integer i; i <- 0; while i < 10 do i <- i + 1 end end",
        );
        let text = serialized(&emitter);
        assert!(text.contains("if_icmplt"));
        assert!(text.contains("goto"));
    }

    #[test]
    fn unknown_identifier_is_fatal() {
        let err = compile_err("program P begin write y end");
        assert!(matches!(err, CompileError::UnknownIdentifier { .. }));
    }

    #[test]
    fn calling_a_variable_as_procedure_is_fatal() {
        let err = compile_err("program P begin integer x; x <- 1; x() end");
        assert!(matches!(err, CompileError::NotAProcedure { .. }));
    }

    #[test]
    fn indexed_assignment_on_scalar_is_fatal() {
        let err = compile_err("program P begin integer x; x[0] <- 1 end");
        assert!(matches!(err, CompileError::NotAnArray { .. }));
    }

    #[test]
    fn array_returning_function_uses_areturn() {
        let emitter = compile_ok(
            "program P define f() -> integer array begin integer array a; a <- array 3; exit a end begin chill end",
        );
        let text = serialized(&emitter);
        assert!(text.contains("areturn"));
    }
}

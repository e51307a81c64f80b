//! Line-oriented QASM-subset parser.
//!
//! Each non-blank, non-comment line has the shape
//! `TYPE(params)? REG[N] (, REG[N])* ;`. `qreg` declares a register;
//! `creg`/`barrier`/`measure` are recognized and skipped; anything else is
//! taken as a gate touching the given register references.

use std::sync::OnceLock;

use regex::Regex;

use crate::ast::{Program, QubitRef, Statement};
use crate::error::{QasmError, Result};

fn ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\w+)\[(\d+)\]$").unwrap())
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn parse_refs(rest: &str) -> Result<Vec<QubitRef>> {
    let re = ref_regex();
    rest.split(',')
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            let caps = re
                .captures(tok)
                .ok_or_else(|| QasmError::ParseError(format!("malformed register reference: '{tok}'")))?;
            Ok(QubitRef {
                register: caps[1].to_string(),
                index: caps[2].parse().expect("regex guarantees digits"),
            })
        })
        .collect()
}

fn parse_statement(raw_line: &str) -> Result<Option<Statement>> {
    let line = strip_comment(raw_line).trim();
    if line.is_empty() || line.starts_with("OPENQASM") || line.starts_with("include") {
        return Ok(None);
    }

    let body = line
        .strip_suffix(';')
        .ok_or_else(|| QasmError::ParseError(format!("missing ';' in: {raw_line}")))?;

    let mut parts = body.splitn(2, char::is_whitespace);
    let head = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim();
    let type_tag = head.split('(').next().unwrap_or(head);

    if matches!(type_tag, "creg" | "barrier" | "measure") {
        return Ok(Some(Statement::Skip));
    }

    let refs = parse_refs(rest)?;
    if type_tag == "qreg" {
        let decl = refs
            .into_iter()
            .next()
            .ok_or_else(|| QasmError::ParseError(format!("qreg with no register: {raw_line}")))?;
        return Ok(Some(Statement::QReg { name: decl.register, size: decl.index }));
    }

    Ok(Some(Statement::Gate { gate_type: type_tag.to_string(), refs }))
}

pub fn parse_qasm_str(source: &str) -> Result<Program> {
    let mut statements = Vec::new();
    for raw_line in source.lines() {
        if let Some(stmt) = parse_statement(raw_line)? {
            statements.push(stmt);
        }
    }
    Ok(Program { statements })
}

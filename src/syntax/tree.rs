use super::lexer::{tokenize, Token, TokenKind};
use std::fmt;
use std::ops::Range;

/// Words that look like calls when followed by `(` but never are.
const NON_CALL_WORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "synchronized", "return", "new", "throw", "assert",
    "super", "this", "try",
];

const TYPE_KEYWORDS: &[&str] = &["class", "interface", "enum", "record"];

/// One node of a lossless Java syntax tree.
///
/// Only the constructs the migration rewrites need are modelled; everything
/// else is kept as verbatim [`Node::Text`]. Printing an untouched tree gives
/// back the exact input.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Package(Package),
    Import(Import),
    Annotation(Annotation),
    Type(TypeDecl),
    Routine(Routine),
    Call(Call),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub name: String,
    pub is_static: bool,
    raw: String,
}

impl Import {
    pub fn new(name: &str) -> Self {
        Import {
            name: name.to_string(),
            is_static: false,
            raw: format!("import {name};"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationArg {
    pub key: Option<String>,
    pub value: String,
}

impl fmt::Display for AnnotationArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "{key} = {}", self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// `@Name` or `@Name(args)`. Printed verbatim until an argument changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    args: Option<Vec<AnnotationArg>>,
    raw: String,
    dirty: bool,
}

impl Annotation {
    /// Last segment of a possibly qualified name.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn args(&self) -> &[AnnotationArg] {
        self.args.as_deref().unwrap_or(&[])
    }

    /// Value of `key`; `value` also matches a single unnamed argument.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args().iter().find_map(|a| match &a.key {
            Some(k) if k == key => Some(a.value.as_str()),
            None if key == "value" => Some(a.value.as_str()),
            _ => None,
        })
    }

    /// Replace the value of an existing `key`. Returns whether anything changed.
    pub fn set_arg(&mut self, key: &str, value: &str) -> bool {
        let Some(args) = self.args.as_mut() else {
            return false;
        };
        let mut changed = false;
        for arg in args.iter_mut().filter(|a| a.key.as_deref() == Some(key)) {
            if arg.value != value {
                arg.value = value.to_string();
                changed = true;
            }
        }
        self.dirty |= changed;
        changed
    }

    /// Append `key = value`, naming a bare positional argument `value` first.
    pub fn insert_arg(&mut self, key: &str, value: &str) {
        let args = self.args.get_or_insert_with(Vec::new);
        for arg in args.iter_mut().filter(|a| a.key.is_none()) {
            arg.key = Some("value".to_string());
        }
        args.push(AnnotationArg {
            key: Some(key.to_string()),
            value: value.to_string(),
        });
        self.dirty = true;
    }

    pub fn is_modified(&self) -> bool {
        self.dirty
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.dirty {
            return f.write_str(&self.raw);
        }
        write!(f, "@{}", self.name)?;
        if let Some(args) = &self.args {
            let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
            write!(f, "({})", rendered.join(", "))?;
        }
        Ok(())
    }
}

/// Class, interface, enum or record declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub keyword: String,
    pub name: String,
    /// Annotations, modifiers and the declaration line up to and including `{`.
    pub header: Vec<Node>,
    pub body: Vec<Node>,
    close: String,
}

impl TypeDecl {
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        annotations_in(&self.header)
    }

    pub fn annotations_mut(&mut self) -> impl Iterator<Item = &mut Annotation> {
        self.header.iter_mut().filter_map(|n| match n {
            Node::Annotation(a) => Some(a),
            _ => None,
        })
    }

    /// Methods declared directly in this type.
    pub fn routines_mut(&mut self) -> impl Iterator<Item = &mut Routine> {
        self.body.iter_mut().filter_map(|n| match n {
            Node::Routine(r) => Some(r),
            _ => None,
        })
    }
}

/// One formal parameter, kept as raw text with the type and name located.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    raw: String,
    ty: Range<usize>,
    name: Range<usize>,
}

impl Param {
    pub fn ty(&self) -> &str {
        &self.raw[self.ty.clone()]
    }

    pub fn name(&self) -> &str {
        &self.raw[self.name.clone()]
    }

    pub fn set_type(&mut self, ty: &str) {
        let old_len = self.ty.len();
        self.raw.replace_range(self.ty.clone(), ty);
        let end = self.ty.start + ty.len();
        if self.name.start >= self.ty.end {
            let shift = |i: usize| i + ty.len() - old_len;
            self.name = shift(self.name.start)..shift(self.name.end);
        }
        self.ty = self.ty.start..end;
    }
}

/// Method or constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    pub name: String,
    /// Annotations, modifiers, return type and name, everything before `(`.
    pub header: Vec<Node>,
    pub params: Vec<Param>,
    params_fill: String,
    /// From `)` up to the body, or through `;` for abstract methods.
    tail: String,
    pub body: Option<Vec<Node>>,
    close: String,
}

impl Routine {
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        annotations_in(&self.header)
    }

    pub fn annotations_mut(&mut self) -> impl Iterator<Item = &mut Annotation> {
        self.header.iter_mut().filter_map(|n| match n {
            Node::Annotation(a) => Some(a),
            _ => None,
        })
    }
}

/// Method invocation `receiver.name(args)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    /// Simple identifier receiver; `None` for unqualified or chained calls.
    pub receiver: Option<String>,
    /// Verbatim receiver expression, trailing `.` included, when it is longer
    /// than one identifier (`a.b().name(..)`). Only printed without `receiver`.
    pub chain: Vec<Node>,
    pub name: String,
    pub args: Vec<Node>,
    close: String,
}

impl Call {
    /// Invoked on an expression rather than a plain identifier.
    pub fn is_chained(&self) -> bool {
        self.receiver.is_none() && !self.chain.is_empty()
    }

    /// Replace the whole receiver expression with `receiver`.
    pub fn set_receiver(&mut self, receiver: &str) {
        self.receiver = Some(receiver.to_string());
        self.chain.clear();
    }
}

fn annotations_in(nodes: &[Node]) -> impl Iterator<Item = &Annotation> {
    nodes.iter().filter_map(|n| match n {
        Node::Annotation(a) => Some(a),
        _ => None,
    })
}

fn write_nodes(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    nodes.iter().try_for_each(|n| write!(f, "{n}"))
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Text(text) => f.write_str(text),
            Node::Package(p) => f.write_str(&p.raw),
            Node::Import(i) => f.write_str(&i.raw),
            Node::Annotation(a) => write!(f, "{a}"),
            Node::Type(t) => {
                write_nodes(f, &t.header)?;
                write_nodes(f, &t.body)?;
                f.write_str(&t.close)
            }
            Node::Routine(r) => {
                write_nodes(f, &r.header)?;
                f.write_str("(")?;
                if r.params.is_empty() {
                    f.write_str(&r.params_fill)?;
                } else {
                    let params: Vec<&str> = r.params.iter().map(|p| p.raw.as_str()).collect();
                    f.write_str(&params.join(","))?;
                }
                f.write_str(&r.tail)?;
                if let Some(body) = &r.body {
                    f.write_str("{")?;
                    write_nodes(f, body)?;
                    f.write_str(&r.close)?;
                }
                Ok(())
            }
            Node::Call(c) => {
                match &c.receiver {
                    Some(receiver) => write!(f, "{receiver}.")?,
                    None => write_nodes(f, &c.chain)?,
                }
                write!(f, "{}(", c.name)?;
                write_nodes(f, &c.args)?;
                f.write_str(&c.close)
            }
        }
    }
}

impl fmt::Display for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Node::Routine(self.clone()))
    }
}

/// A parsed source file.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub nodes: Vec<Node>,
}

impl fmt::Display for CompilationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_nodes(f, &self.nodes)
    }
}

impl CompilationUnit {
    /// Parse any input; unrecognised text is kept verbatim.
    pub fn parse(src: &str) -> Self {
        let mut parser = Parser {
            tokens: tokenize(src),
            pos: 0,
        };
        let mut nodes = parser.members(false);
        // Unbalanced closers at file level stay as text.
        while parser.pos < parser.tokens.len() {
            let mut rest = parser.members(false);
            if let Some(tok) = parser.bump() {
                push_text(&mut rest, tok.text);
            }
            nodes.append(&mut rest);
        }
        CompilationUnit { nodes }
    }

    pub fn package(&self) -> Option<&str> {
        self.nodes.iter().find_map(|n| match n {
            Node::Package(p) => Some(p.name.as_str()),
            _ => None,
        })
    }

    pub fn imports(&self) -> impl Iterator<Item = &Import> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Import(i) => Some(i),
            _ => None,
        })
    }

    /// Top-level type declarations.
    pub fn types(&self) -> impl Iterator<Item = &TypeDecl> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Type(t) => Some(t),
            _ => None,
        })
    }

    pub fn types_mut(&mut self) -> impl Iterator<Item = &mut TypeDecl> {
        self.nodes.iter_mut().filter_map(|n| match n {
            Node::Type(t) => Some(t),
            _ => None,
        })
    }

    /// Drop every import matching `pred` together with its line break.
    pub fn remove_imports(&mut self, pred: impl Fn(&Import) -> bool) -> Vec<String> {
        let mut removed = Vec::new();
        let mut i = 0;
        while i < self.nodes.len() {
            match &self.nodes[i] {
                Node::Import(import) if pred(import) => {
                    removed.push(import.name.clone());
                    self.nodes.remove(i);
                    if let Some(Node::Text(next)) = self.nodes.get_mut(i) {
                        if let Some(stripped) = next.strip_prefix('\n') {
                            *next = stripped.to_string();
                        }
                    }
                }
                _ => i += 1,
            }
        }
        removed
    }

    /// Add `import name;` after the last import (or the package line).
    ///
    /// Returns `false` when the import is already present.
    pub fn add_import(&mut self, name: &str) -> bool {
        if self.imports().any(|i| i.name == name) {
            return false;
        }
        let new = Node::Import(Import::new(name));
        let last_import = self.nodes.iter().rposition(|n| matches!(n, Node::Import(_)));
        let package = self.nodes.iter().position(|n| matches!(n, Node::Package(_)));
        match (last_import, package) {
            (Some(i), _) => {
                self.nodes.insert(i + 1, Node::Text("\n".to_string()));
                self.nodes.insert(i + 2, new);
            }
            (None, Some(p)) => {
                self.nodes.insert(p + 1, Node::Text("\n\n".to_string()));
                self.nodes.insert(p + 2, new);
            }
            (None, None) => {
                self.nodes.insert(0, new);
                self.nodes.insert(1, Node::Text("\n\n".to_string()));
            }
        }
        true
    }

    pub fn walk_mut<V: VisitMut + ?Sized>(&mut self, visitor: &mut V) {
        walk_nodes(visitor, &mut self.nodes);
    }
}

/// Mutable traversal over a [`CompilationUnit`].
///
/// Override the `visit_*` hooks; call the matching `walk_*` function from an
/// override to keep descending.
pub trait VisitMut {
    fn visit_node(&mut self, node: &mut Node) {
        walk_node(self, node);
    }
    fn visit_import(&mut self, _import: &mut Import) {}
    fn visit_annotation(&mut self, _annotation: &mut Annotation) {}
    fn visit_type(&mut self, decl: &mut TypeDecl) {
        walk_type(self, decl);
    }
    fn visit_routine(&mut self, routine: &mut Routine) {
        walk_routine(self, routine);
    }
    fn visit_param(&mut self, _param: &mut Param) {}
    fn visit_call(&mut self, call: &mut Call) {
        walk_call(self, call);
    }
}

pub fn walk_node<V: VisitMut + ?Sized>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Import(i) => visitor.visit_import(i),
        Node::Annotation(a) => visitor.visit_annotation(a),
        Node::Type(t) => visitor.visit_type(t),
        Node::Routine(r) => visitor.visit_routine(r),
        Node::Call(c) => visitor.visit_call(c),
        Node::Text(_) | Node::Package(_) => {}
    }
}

pub fn walk_nodes<V: VisitMut + ?Sized>(visitor: &mut V, nodes: &mut [Node]) {
    for node in nodes {
        visitor.visit_node(node);
    }
}

pub fn walk_type<V: VisitMut + ?Sized>(visitor: &mut V, decl: &mut TypeDecl) {
    walk_nodes(visitor, &mut decl.header);
    walk_nodes(visitor, &mut decl.body);
}

pub fn walk_routine<V: VisitMut + ?Sized>(visitor: &mut V, routine: &mut Routine) {
    walk_nodes(visitor, &mut routine.header);
    for param in &mut routine.params {
        visitor.visit_param(param);
    }
    if let Some(body) = &mut routine.body {
        walk_nodes(visitor, body);
    }
}

pub fn walk_call<V: VisitMut + ?Sized>(visitor: &mut V, call: &mut Call) {
    walk_nodes(visitor, &mut call.chain);
    walk_nodes(visitor, &mut call.args);
}

/// Remove and return the nodes printing the last `len` bytes of `nodes`.
///
/// A text node straddling the cut is split; any other node is taken whole.
fn split_tail(nodes: &mut Vec<Node>, mut len: usize) -> Vec<Node> {
    let mut tail = Vec::new();
    while len > 0 {
        let Some(node) = nodes.pop() else { break };
        let printed = node.to_string().len();
        match node {
            Node::Text(mut text) if printed > len && text.is_char_boundary(printed - len) => {
                let rest = text.split_off(printed - len);
                nodes.push(Node::Text(text));
                tail.push(Node::Text(rest));
                len = 0;
            }
            other => {
                tail.push(other);
                len = len.saturating_sub(printed);
            }
        }
    }
    tail.reverse();
    tail
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<'a>> {
        self.tokens.get(self.pos)
    }

    fn at(&self, i: usize) -> Option<&Token<'a>> {
        self.tokens.get(i)
    }

    fn bump(&mut self) -> Option<Token<'a>> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn text(&self, range: Range<usize>) -> String {
        self.tokens[range].iter().map(|t| t.text).collect()
    }

    fn next_significant(&self, from: usize) -> Option<usize> {
        (from..self.tokens.len()).find(|&i| !self.tokens[i].is_trivia())
    }

    fn prev_significant(&self, before: usize) -> Option<&Token<'a>> {
        self.prev_significant_idx(before).map(|i| &self.tokens[i])
    }

    fn prev_significant_idx(&self, before: usize) -> Option<usize> {
        (0..before).rev().find(|&i| !self.tokens[i].is_trivia())
    }

    /// Index of the `(` or `[` matching the closer at `close`.
    fn matching_open(&self, close: usize) -> Option<usize> {
        let (open_c, close_c) = if self.tokens[close].is_punct(']') {
            ('[', ']')
        } else {
            ('(', ')')
        };
        let mut depth = 0usize;
        for i in (0..=close).rev() {
            let tok = &self.tokens[i];
            if tok.is_punct(close_c) {
                depth += 1;
            } else if tok.is_punct(open_c) {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// First token of the receiver expression ending at the `.` at `dot`.
    ///
    /// Follows `primary(.member)*` backwards, where a primary is an
    /// identifier, a literal or a bracketed group with its callee, and takes
    /// a leading `new` along.
    fn receiver_start(&self, dot: usize) -> usize {
        let mut start = dot;
        let mut dot = dot;
        while let Some(mut j) = self.prev_significant_idx(dot) {
            let tok = &self.tokens[j];
            if tok.is_punct(')') || tok.is_punct(']') {
                let Some(open) = self.matching_open(j) else {
                    break;
                };
                j = open;
                if let Some(k) = self.prev_significant_idx(open) {
                    let callee = &self.tokens[k];
                    if callee.kind == TokenKind::Ident && !NON_CALL_WORDS.contains(&callee.text) {
                        j = k;
                    }
                }
            } else if !matches!(tok.kind, TokenKind::Ident | TokenKind::Literal) {
                break;
            }
            start = j;
            match self.prev_significant_idx(j) {
                Some(k) if self.tokens[k].is_punct('.') => dot = k,
                Some(k) if self.tokens[k].is_ident("new") => {
                    start = k;
                    break;
                }
                _ => break,
            }
        }
        start
    }

    /// Index of the `)` matching the `(` at `open`.
    fn matching_paren(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(open) {
            if tok.is_punct('(') {
                depth += 1;
            } else if tok.is_punct(')') {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        None
    }

    /// Member-level items until an unmatched `}` (left unconsumed) or the end.
    fn members(&mut self, in_body: bool) -> Vec<Node> {
        let mut out = Vec::new();
        let mut member: Vec<Node> = Vec::new();
        while let Some(tok) = self.peek().cloned() {
            if tok.is_punct('}') {
                break;
            }
            if tok.is_trivia() {
                self.pos += 1;
                let target = if member.is_empty() { &mut out } else { &mut member };
                push_text(target, tok.text);
                continue;
            }
            if !in_body && (tok.is_ident("package") || tok.is_ident("import")) {
                member.push(self.package_or_import());
                out.append(&mut member);
                continue;
            }
            if tok.is_punct('@') {
                if let Some(annotation) = self.annotation() {
                    member.push(Node::Annotation(annotation));
                    continue;
                }
            }
            if tok.kind == TokenKind::Ident && TYPE_KEYWORDS.contains(&tok.text) {
                if let Some(decl) = self.type_decl(&mut member) {
                    member.push(Node::Type(decl));
                    out.append(&mut member);
                    continue;
                }
            }
            if in_body && tok.kind == TokenKind::Ident {
                if let Some(routine) = self.routine(&mut member) {
                    member.push(Node::Routine(routine));
                    out.append(&mut member);
                    continue;
                }
            }
            self.pos += 1;
            push_text(&mut member, tok.text);
            if in_body && tok.is_punct('=') {
                let mut init = self.code(';');
                member.append(&mut init);
            } else if in_body && tok.is_punct('{') {
                let mut block = self.code('}');
                member.append(&mut block);
                if let Some(close) = self.peek().filter(|t| t.is_punct('}')).cloned() {
                    self.pos += 1;
                    push_text(&mut member, close.text);
                }
                out.append(&mut member);
            } else if tok.is_punct(';') {
                out.append(&mut member);
            }
        }
        out.append(&mut member);
        out
    }

    fn package_or_import(&mut self) -> Node {
        let start = self.pos;
        let end = (start..self.tokens.len())
            .find(|&i| self.tokens[i].is_punct(';'))
            .map_or(self.tokens.len(), |i| i + 1);
        self.pos = end;
        let raw = self.text(start..end);
        let significant: Vec<&Token<'_>> = self.tokens[start + 1..end]
            .iter()
            .filter(|t| !t.is_trivia() && !t.is_punct(';'))
            .collect();
        let is_static = significant.first().is_some_and(|t| t.is_ident("static"));
        let name: String = significant
            .iter()
            .skip(usize::from(is_static))
            .map(|t| t.text)
            .collect();
        if self.tokens[start].is_ident("package") {
            Node::Package(Package { name, raw })
        } else {
            Node::Import(Import {
                name,
                is_static,
                raw,
            })
        }
    }

    fn qualified_name_end(&self, from: usize) -> usize {
        let mut end = from + 1;
        while self.at(end).is_some_and(|t| t.is_punct('.'))
            && self.at(end + 1).is_some_and(|t| t.kind == TokenKind::Ident)
        {
            end += 2;
        }
        end
    }

    fn annotation(&mut self) -> Option<Annotation> {
        let start = self.pos;
        let first = self.at(start + 1)?;
        if first.kind != TokenKind::Ident || first.text == "interface" {
            return None;
        }
        let name_end = self.qualified_name_end(start + 1);
        let name = self.text(start + 1..name_end);
        let (args, end) = match self.at(name_end) {
            Some(t) if t.is_punct('(') => {
                let close = self.matching_paren(name_end)?;
                (Some(self.annotation_args(name_end + 1..close)), close + 1)
            }
            _ => (None, name_end),
        };
        self.pos = end;
        Some(Annotation {
            name,
            args,
            raw: self.text(start..end),
            dirty: false,
        })
    }

    fn split_top_level(&self, range: Range<usize>) -> Vec<Range<usize>> {
        let mut parts = Vec::new();
        let mut depth = 0i32;
        let mut angle = 0i32;
        let mut start = range.start;
        for i in range.clone() {
            let tok = &self.tokens[i];
            if tok.kind != TokenKind::Punct {
                continue;
            }
            match tok.text {
                "(" | "{" | "[" => depth += 1,
                ")" | "}" | "]" => depth -= 1,
                "<" if depth == 0 => angle += 1,
                ">" if depth == 0 => angle -= 1,
                "," if depth == 0 && angle <= 0 => {
                    parts.push(start..i);
                    start = i + 1;
                }
                _ => {}
            }
        }
        parts.push(start..range.end);
        parts
    }

    fn annotation_args(&self, range: Range<usize>) -> Vec<AnnotationArg> {
        if self.tokens[range.clone()].iter().all(Token::is_trivia) {
            return Vec::new();
        }
        self.split_top_level(range)
            .into_iter()
            .map(|part| {
                let key_idx = self.next_significant(part.start).filter(|&i| i < part.end);
                let eq_idx = key_idx.and_then(|i| self.next_significant(i + 1));
                match (key_idx, eq_idx) {
                    (Some(k), Some(e))
                        if e < part.end
                            && self.tokens[k].kind == TokenKind::Ident
                            && self.tokens[e].is_punct('=')
                            && !self.at(e + 1).is_some_and(|t| t.is_punct('=')) =>
                    {
                        AnnotationArg {
                            key: Some(self.tokens[k].text.to_string()),
                            value: self.text(e + 1..part.end).trim().to_string(),
                        }
                    }
                    _ => AnnotationArg {
                        key: None,
                        value: self.text(part).trim().to_string(),
                    },
                }
            })
            .collect()
    }

    fn type_decl(&mut self, member: &mut Vec<Node>) -> Option<TypeDecl> {
        let start = self.pos;
        if self.prev_significant(start).is_some_and(|t| t.is_punct('.')) {
            return None;
        }
        let name_idx = self.next_significant(start + 1)?;
        if self.tokens[name_idx].kind != TokenKind::Ident {
            return None;
        }
        let mut depth = 0i32;
        let mut brace = None;
        for i in name_idx + 1..self.tokens.len() {
            let tok = &self.tokens[i];
            if tok.is_punct('(') {
                depth += 1;
            } else if tok.is_punct(')') {
                depth -= 1;
            } else if depth == 0 && tok.is_punct('{') {
                brace = Some(i);
                break;
            } else if depth == 0 && (tok.is_punct(';') || tok.is_punct('}') || tok.is_punct('=')) {
                return None;
            }
        }
        let brace = brace?;
        let mut header = std::mem::take(member);
        push_text(&mut header, &self.text(start..brace + 1));
        self.pos = brace + 1;
        let body = self.members(true);
        let close = match self.peek() {
            Some(t) if t.is_punct('}') => {
                self.pos += 1;
                "}".to_string()
            }
            _ => String::new(),
        };
        Some(TypeDecl {
            keyword: self.tokens[start].text.to_string(),
            name: self.tokens[name_idx].text.to_string(),
            header,
            body,
            close,
        })
    }

    fn routine(&mut self, member: &mut Vec<Node>) -> Option<Routine> {
        let start = self.pos;
        let open = self.next_significant(start + 1)?;
        if !self.tokens[open].is_punct('(') {
            return None;
        }
        let close = self.matching_paren(open)?;
        let mut end = close + 1;
        let has_body = loop {
            let tok = self.at(end)?;
            if tok.is_punct('{') {
                break true;
            }
            if tok.is_punct(';') {
                break false;
            }
            let allowed = tok.is_trivia()
                || tok.kind == TokenKind::Ident
                || matches!(tok.text, "." | "," | "<" | ">" | "?" | "[" | "]" | "&");
            if !allowed {
                return None;
            }
            end += 1;
        };

        let mut header = std::mem::take(member);
        push_text(&mut header, &self.text(start..open));
        let params = if self.tokens[open + 1..close].iter().all(Token::is_trivia) {
            Vec::new()
        } else {
            self.split_top_level(open + 1..close)
                .into_iter()
                .map(|r| self.param(r))
                .collect()
        };
        let params_fill = if params.is_empty() {
            self.text(open + 1..close)
        } else {
            String::new()
        };
        let tail_end = if has_body { end } else { end + 1 };
        let tail = self.text(close..tail_end);
        self.pos = tail_end;

        let (body, close_text) = if has_body {
            self.pos += 1;
            let body = self.code('}');
            let close_text = match self.peek() {
                Some(t) if t.is_punct('}') => {
                    self.pos += 1;
                    "}".to_string()
                }
                _ => String::new(),
            };
            (Some(body), close_text)
        } else {
            (None, String::new())
        };

        Some(Routine {
            name: self.tokens[start].text.to_string(),
            header,
            params,
            params_fill,
            tail,
            body,
            close: close_text,
        })
    }

    fn param(&self, range: Range<usize>) -> Param {
        let raw = self.text(range.clone());
        let mut offset = 0usize;
        let mut spans = Vec::new();
        for tok in &self.tokens[range.clone()] {
            spans.push((offset, offset + tok.text.len()));
            offset += tok.text.len();
        }
        let toks = &self.tokens[range];

        // Skip annotations and `final` before the type.
        let mut i = 0;
        loop {
            while toks.get(i).is_some_and(Token::is_trivia) {
                i += 1;
            }
            match toks.get(i) {
                Some(t) if t.is_punct('@') => {
                    i += 1;
                    while toks
                        .get(i)
                        .is_some_and(|t| t.kind == TokenKind::Ident || t.is_punct('.'))
                    {
                        i += 1;
                    }
                    if toks.get(i).is_some_and(|t| t.is_punct('(')) {
                        let mut depth = 0;
                        while let Some(t) = toks.get(i) {
                            if t.is_punct('(') {
                                depth += 1;
                            } else if t.is_punct(')') {
                                depth -= 1;
                                if depth == 0 {
                                    i += 1;
                                    break;
                                }
                            }
                            i += 1;
                        }
                    }
                }
                Some(t) if t.is_ident("final") => i += 1,
                _ => break,
            }
        }

        let name_idx = toks.iter().rposition(|t| t.kind == TokenKind::Ident);
        match name_idx {
            Some(n) if n > i => {
                let ty_end = toks[..n]
                    .iter()
                    .rposition(|t| !t.is_trivia())
                    .map_or(spans[i].0, |j| spans[j].1);
                Param {
                    raw,
                    ty: spans[i].0..ty_end.max(spans[i].0),
                    name: spans[n].0..spans[n].1,
                }
            }
            _ => Param {
                raw,
                ty: 0..0,
                name: 0..0,
            },
        }
    }

    /// Detach the receiver of the call named at `name_idx` from `nodes`.
    fn call_receiver(&self, name_idx: usize, nodes: &mut Vec<Node>) -> (Option<String>, Vec<Node>) {
        let Some(dot) = self
            .prev_significant_idx(name_idx)
            .filter(|&i| self.tokens[i].is_punct('.'))
        else {
            return (None, Vec::new());
        };
        let start = self.receiver_start(dot);
        let chain = split_tail(nodes, self.text(start..name_idx).len());

        let simple = dot + 1 == name_idx
            && start + 1 == dot
            && self.tokens[start].kind == TokenKind::Ident
            && !self.tokens[start].is_ident("new");
        if simple {
            (Some(self.tokens[start].text.to_string()), Vec::new())
        } else {
            (None, chain)
        }
    }

    /// Statement-level code until `stop` at nesting depth zero (left unconsumed).
    fn code(&mut self, stop: char) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut depth = 0usize;
        while let Some(tok) = self.peek().cloned() {
            if depth == 0 && tok.is_punct(stop) {
                break;
            }
            if tok.kind == TokenKind::Punct {
                match tok.text {
                    "(" | "{" | "[" => depth += 1,
                    ")" | "}" | "]" => {
                        if depth == 0 {
                            break;
                        }
                        depth -= 1;
                    }
                    _ => {}
                }
            }
            let is_call = tok.kind == TokenKind::Ident
                && !NON_CALL_WORDS.contains(&tok.text)
                && self.at(self.pos + 1).is_some_and(|t| t.is_punct('('))
                && !self.prev_significant(self.pos).is_some_and(|t| t.is_ident("new"));
            if is_call {
                let name_idx = self.pos;
                let (receiver, chain) = self.call_receiver(name_idx, &mut nodes);
                self.pos += 2;
                let args = self.code(')');
                let close = match self.peek() {
                    Some(t) if t.is_punct(')') => {
                        self.pos += 1;
                        ")".to_string()
                    }
                    _ => String::new(),
                };
                nodes.push(Node::Call(Call {
                    receiver,
                    chain,
                    name: tok.text.to_string(),
                    args,
                    close,
                }));
                continue;
            }
            self.pos += 1;
            push_text(&mut nodes, tok.text);
        }
        nodes
    }
}

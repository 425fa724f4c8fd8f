use std::collections::HashMap;
use std::iter;

use tracing::trace;
use tree_sitter::Node;

use crate::invoke::{ProviderOutput, Row};
use crate::java::node_text;
use crate::model::ReturnShape;

const MAX_CALL_DEPTH: usize = 8;

const CONTROL_FLOW: &[&str] = &[
    "if_statement",
    "for_statement",
    "enhanced_for_statement",
    "while_statement",
    "do_statement",
    "switch_expression",
    "switch_statement",
    "try_statement",
    "try_with_resources_statement",
    "synchronized_statement",
];

/// Collection methods that add exactly one element.
const APPENDERS: &[&str] = &[
    "add",
    "addElement",
    "addFirst",
    "addLast",
    "offer",
    "offerFirst",
    "offerLast",
    "push",
];

/// Collection methods that leave the receiver's size alone.
const READERS: &[&str] = &[
    "contains",
    "containsAll",
    "element",
    "equals",
    "forEach",
    "get",
    "getFirst",
    "getLast",
    "hashCode",
    "indexOf",
    "isEmpty",
    "iterator",
    "lastIndexOf",
    "listIterator",
    "parallelStream",
    "peek",
    "peekFirst",
    "peekLast",
    "size",
    "sort",
    "spliterator",
    "stream",
    "toArray",
    "toString",
];

/// Why a provider body could not be reduced to rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalFailure {
    /// The body throws before returning; holds the exception type.
    Threw(String),
    /// The body does something this evaluator does not model.
    Unsupported(String),
}

fn unsupported(reason: impl Into<String>) -> EvalFailure {
    EvalFailure::Unsupported(reason.into())
}

/// The rows a provider body evaluates to.
///
/// Rows written out in the source are kept with their arguments. Rows that
/// come from a size or a numeric range (`new Object[n][]`,
/// `IntStream.range(a, b)`) are only counted, so a large literal never
/// turns into a large allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rows {
    listed: Vec<Row>,
    counted: usize,
}

impl Rows {
    pub fn listed(rows: Vec<Row>) -> Self {
        Self { listed: rows, counted: 0 }
    }

    pub fn counted(count: usize) -> Self {
        Self { listed: Vec::new(), counted: count }
    }

    pub fn len(&self) -> usize {
        self.listed.len().saturating_add(self.counted)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows whose arguments are known, in source order.
    pub fn known(&self) -> &[Row] {
        &self.listed
    }

    fn push(&mut self, row: Row) {
        self.listed.push(row);
    }

    fn extend(&mut self, other: Rows) {
        self.listed.extend(other.listed);
        self.counted = self.counted.saturating_add(other.counted);
    }

    fn clear(&mut self) {
        self.listed.clear();
        self.counted = 0;
    }

    fn limit(&mut self, max: usize) {
        if max <= self.listed.len() {
            self.listed.truncate(max);
            self.counted = 0;
        } else {
            self.counted = self.counted.min(max - self.listed.len());
        }
    }

    fn skip(&mut self, n: usize) {
        if n <= self.listed.len() {
            self.listed.drain(..n);
        } else {
            self.counted = self.counted.saturating_sub(n - self.listed.len());
            self.listed.clear();
        }
    }

    /// Wraps the rows the way a provider of `shape` hands them back. A
    /// sequence yields counted rows one at a time, as a Java stream would.
    pub fn into_output(self, shape: ReturnShape) -> ProviderOutput {
        match shape {
            ReturnShape::FixedTable if self.counted == 0 => ProviderOutput::Table(self.listed),
            ReturnShape::FixedTable => ProviderOutput::Blank(self.len()),
            ReturnShape::LazySequence => ProviderOutput::sequence(
                self.listed
                    .into_iter()
                    .chain(iter::repeat(Row::new()).take(self.counted)),
            ),
        }
    }
}

/// Evaluates the body of a provider method to the rows it returns.
///
/// Only straight-line bodies are modelled: local declarations, `add` calls
/// on local lists, a `throw`, and a final `return` of an array or
/// collection expression. Zero-argument calls to other methods of the same
/// class are followed. Anything that could change a local collection
/// without being modelled fails instead of undercounting.
pub fn evaluate_method(method: &Node, source: &str) -> Result<Rows, EvalFailure> {
    let class_body = method.parent();
    let mut evaluator = Evaluator {
        source,
        class_body,
        depth: 0,
    };
    evaluator.method(method)
}

type Locals = HashMap<String, Rows>;

struct Evaluator<'t, 's> {
    source: &'s str,
    class_body: Option<Node<'t>>,
    depth: usize,
}

impl<'t, 's> Evaluator<'t, 's> {
    fn text(&self, node: &Node) -> &'s str {
        node_text(node, self.source)
    }

    fn method(&mut self, method: &Node<'t>) -> Result<Rows, EvalFailure> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(unsupported("call chain too deep"));
        }
        let body = method
            .child_by_field_name("body")
            .ok_or_else(|| unsupported("method has no body"))?;

        self.depth += 1;
        let mut locals = Locals::new();
        let result = self.block(&body, &mut locals);
        self.depth -= 1;
        result
    }

    fn block(&mut self, block: &Node<'t>, locals: &mut Locals) -> Result<Rows, EvalFailure> {
        let mut cursor = block.walk();
        let statements: Vec<Node<'t>> = block.named_children(&mut cursor).collect();

        for statement in statements {
            trace!(kind = statement.kind(), "evaluating statement");
            match statement.kind() {
                "line_comment" | "block_comment" => {}
                "local_variable_declaration" => self.declare(&statement, locals)?,
                "expression_statement" => {
                    if let Some(expression) = statement.named_child(0) {
                        self.effect(&expression, locals)?;
                    }
                }
                "throw_statement" => {
                    let thrown = statement
                        .named_child(0)
                        .ok_or_else(|| unsupported("empty throw"))?;
                    return Err(EvalFailure::Threw(self.exception_name(&thrown)));
                }
                "return_statement" => {
                    let value = statement
                        .named_child(0)
                        .ok_or_else(|| unsupported("return without a value"))?;
                    return self.rows(&value, locals);
                }
                "block" => return self.block(&statement, locals),
                kind if CONTROL_FLOW.contains(&kind) => {
                    return Err(unsupported(format!("control flow ({kind})")));
                }
                _ => {}
            }
        }
        Err(unsupported("no return statement"))
    }

    fn declare(
        &mut self,
        declaration: &Node<'t>,
        locals: &mut Locals,
    ) -> Result<(), EvalFailure> {
        let mut cursor = declaration.walk();
        let declarators: Vec<Node<'t>> = declaration
            .children_by_field_name("declarator", &mut cursor)
            .collect();

        for declarator in declarators {
            let Some(name) = declarator.child_by_field_name("name") else {
                continue;
            };
            let name = self.text(&name).to_string();
            let Some(value) = declarator.child_by_field_name("value") else {
                locals.remove(&name);
                continue;
            };
            self.assign(name, &value, locals)?;
        }
        Ok(())
    }

    /// Binds `name` to the rows of `value`, or forgets it when `value` is
    /// not a row source.
    fn assign(
        &mut self,
        name: String,
        value: &Node<'t>,
        locals: &mut Locals,
    ) -> Result<(), EvalFailure> {
        self.check_escape(value, locals)?;
        match self.rows(value, locals) {
            Ok(rows) => {
                locals.insert(name, rows);
            }
            Err(_) => {
                locals.remove(&name);
            }
        }
        Ok(())
    }

    /// Applies an expression statement to the tracked locals.
    fn effect(&mut self, expression: &Node<'t>, locals: &mut Locals) -> Result<(), EvalFailure> {
        match expression.kind() {
            "assignment_expression" => {
                let (Some(left), Some(right)) = (
                    expression.child_by_field_name("left"),
                    expression.child_by_field_name("right"),
                ) else {
                    return Ok(());
                };
                if left.kind() != "identifier" {
                    return self.check_escape(&right, locals);
                }
                let name = self.text(&left).to_string();
                self.assign(name, &right, locals)
            }
            "method_invocation" => {
                let receiver = expression
                    .child_by_field_name("object")
                    .map(|o| self.text(&o));
                let method = self.method_name(expression);
                let args = self.arguments(expression);

                if let Some(target) = receiver.filter(|r| locals.contains_key(*r)) {
                    return self.mutate(target, method, &args, expression, locals);
                }
                if receiver.is_some_and(|r| owner(r) == "Collections") && method == "addAll" {
                    if let [first, elements @ ..] = args.as_slice() {
                        let target = self.text(first);
                        if first.kind() == "identifier" && locals.contains_key(target) {
                            let added = self.spread(elements, locals)?;
                            if let Some(rows) = locals.get_mut(target) {
                                rows.extend(added);
                            }
                            return Ok(());
                        }
                    }
                }
                self.check_escape(expression, locals)
            }
            _ => self.check_escape(expression, locals),
        }
    }

    /// A method called on the tracked local `target`.
    fn mutate(
        &mut self,
        target: &str,
        method: &str,
        args: &[Node<'t>],
        call: &Node<'t>,
        locals: &mut Locals,
    ) -> Result<(), EvalFailure> {
        for arg in args {
            self.check_escape(arg, locals)?;
        }
        let added = match (method, args) {
            ("add", [_, element]) => Rows::listed(vec![self.row(element)]),
            (appender, [element]) if APPENDERS.contains(&appender) => {
                Rows::listed(vec![self.row(element)])
            }
            ("addAll", [source] | [_, source]) => self.rows(source, locals)?,
            ("clear", []) => {
                if let Some(rows) = locals.get_mut(target) {
                    rows.clear();
                }
                return Ok(());
            }
            (reader, _) if READERS.contains(&reader) => return Ok(()),
            _ => return Err(unsupported(format!("mutation {}", self.text(call)))),
        };
        if let Some(rows) = locals.get_mut(target) {
            rows.extend(added);
        }
        Ok(())
    }

    /// Fails when `node` contains a call that could change a tracked local
    /// out of sight: an unmodelled method on it, or handing it to a method
    /// that is not known to only read its arguments.
    fn check_escape(&self, node: &Node<'t>, locals: &Locals) -> Result<(), EvalFailure> {
        if locals.is_empty() {
            return Ok(());
        }
        let mut pending = vec![*node];
        while let Some(current) = pending.pop() {
            if current.kind() == "method_invocation" && self.escapes_through(&current, locals) {
                return Err(unsupported(format!(
                    "{} may change a local collection",
                    self.text(&current)
                )));
            }
            let mut cursor = current.walk();
            pending.extend(current.named_children(&mut cursor));
        }
        Ok(())
    }

    fn escapes_through(&self, call: &Node<'t>, locals: &Locals) -> bool {
        let method = self.method_name(call);
        let receiver = call.child_by_field_name("object").map(|o| self.text(&o));
        let on_local = receiver.is_some_and(|r| locals.contains_key(r));
        if on_local && !READERS.contains(&method) {
            return true;
        }

        let passes_local = self
            .arguments(call)
            .iter()
            .any(|arg| arg.kind() == "identifier" && locals.contains_key(self.text(arg)));
        let reads_only = on_local
            || match receiver.map(owner) {
                Some("Collections") => method != "addAll",
                // `System.out` and `System.err` print their arguments.
                Some("out" | "err") => true,
                Some("Arrays" | "List" | "Set" | "Stream" | "Objects" | "String") => true,
                _ => false,
            };
        passes_local && !reads_only
    }

    /// Rows produced by an array, collection, stream or iterator expression.
    fn rows(&mut self, node: &Node<'t>, locals: &Locals) -> Result<Rows, EvalFailure> {
        match node.kind() {
            "array_initializer" => Ok(self.initializer_rows(node)),
            "array_creation_expression" => {
                if let Some(initializer) = node.child_by_field_name("value") {
                    return Ok(self.initializer_rows(&initializer));
                }
                let size = self.first_dimension(node)?;
                Ok(Rows::counted(size))
            }
            "identifier" => {
                let name = self.text(node);
                locals
                    .get(name)
                    .cloned()
                    .ok_or_else(|| unsupported(format!("unknown value {name}")))
            }
            "null_literal" => Err(EvalFailure::Threw("NullPointerException".to_string())),
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.rows(&inner, locals),
                None => Err(unsupported("empty parentheses")),
            },
            "cast_expression" => match node.child_by_field_name("value") {
                Some(inner) => self.rows(&inner, locals),
                None => Err(unsupported(self.text(node))),
            },
            "object_creation_expression" => self.construct(node, locals),
            "method_invocation" => self.call(node, locals),
            _ => Err(unsupported(format!("expression {}", self.text(node)))),
        }
    }

    fn initializer_rows(&self, initializer: &Node) -> Rows {
        let mut cursor = initializer.walk();
        let rows = initializer
            .named_children(&mut cursor)
            .filter(|c| !c.kind().ends_with("comment"))
            .map(|element| self.row(&element))
            .collect();
        Rows::listed(rows)
    }
    /// Arguments of one case: the elements of an inline array, or the
    /// expression itself.
    fn row(&self, element: &Node) -> Row {
        let initializer = match element.kind() {
            "array_initializer" => Some(*element),
            "array_creation_expression" => element.child_by_field_name("value"),
            _ => None,
        };
        match initializer {
            Some(initializer) => {
                let mut cursor = initializer.walk();
                let row = initializer
                    .named_children(&mut cursor)
                    .filter(|c| !c.kind().ends_with("comment"))
                    .map(|c| self.text(&c).to_string())
                    .collect();
                row
            }
            None => vec![self.text(element).to_string()],
        }
    }

    fn first_dimension(&self, creation: &Node) -> Result<usize, EvalFailure> {
        let mut cursor = creation.walk();
        let dimension = creation
            .named_children(&mut cursor)
            .find(|c| c.kind() == "dimensions_expr")
            .and_then(|d| d.named_child(0))
            .ok_or_else(|| unsupported(self.text(creation)))?;
        self.int_literal(&dimension)
    }

    fn int_literal(&self, node: &Node) -> Result<usize, EvalFailure> {
        let text = self.text(node).replace('_', "");
        let parsed = match node.kind() {
            "decimal_integer_literal" => text.trim_end_matches(['l', 'L']).parse().ok(),
            "hex_integer_literal" => {
                let digits = text
                    .trim_start_matches("0x")
                    .trim_start_matches("0X")
                    .trim_end_matches(['l', 'L']);
                usize::from_str_radix(digits, 16).ok()
            }
            _ => None,
        };
        parsed.ok_or_else(|| unsupported(format!("non-literal size {text}")))
    }

    fn construct(
        &mut self,
        node: &Node<'t>,
        locals: &Locals,
    ) -> Result<Rows, EvalFailure> {
        let type_text = node
            .child_by_field_name("type")
            .map(|t| self.text(&t))
            .unwrap_or_default();
        let simple = type_text.split('<').next().unwrap_or(type_text).trim();
        let simple = simple.rsplit('.').next().unwrap_or(simple);
        if !matches!(
            simple,
            "ArrayList" | "LinkedList" | "Vector" | "ArrayDeque" | "CopyOnWriteArrayList"
        ) {
            return Err(unsupported(format!("construction of {type_text}")));
        }

        let args = self.arguments(node);
        match args.as_slice() {
            [] => Ok(Rows::default()),
            [capacity] if capacity.kind().ends_with("integer_literal") => Ok(Rows::default()),
            [source] => self.rows(source, locals),
            _ => Err(unsupported(self.text(node))),
        }
    }

    fn call(
        &mut self,
        node: &Node<'t>,
        locals: &Locals,
    ) -> Result<Rows, EvalFailure> {
        let name = self.method_name(node);
        let object = node.child_by_field_name("object");
        let args = self.arguments(node);
        let receiver = object.map(|o| self.text(&o)).map(owner);

        match (receiver, name) {
            (Some("Arrays"), "asList" | "stream")
            | (Some("List" | "Set" | "Stream"), "of")
            | (Some("Stream"), "ofNullable") => self.spread(&args, locals),
            (Some("List" | "Set"), "copyOf")
            | (
                Some("Collections"),
                "unmodifiableList" | "unmodifiableCollection" | "synchronizedList",
            ) => match args.as_slice() {
                [source] => self.rows(source, locals),
                _ => Err(unsupported(self.text(node))),
            },
            (Some("Collections"), "emptyIterator" | "emptyList" | "emptySet")
            | (Some("Stream"), "empty") => Ok(Rows::default()),
            (Some("Collections"), "singletonList" | "singleton") => match args.as_slice() {
                [only] => Ok(Rows::listed(vec![self.row(only)])),
                _ => Err(unsupported(self.text(node))),
            },
            (Some("IntStream" | "LongStream"), "range" | "rangeClosed") => {
                let [from, to] = args.as_slice() else {
                    return Err(unsupported(self.text(node)));
                };
                let from = self.int_literal(from)?;
                let mut to = self.int_literal(to)?;
                if name == "rangeClosed" {
                    to = to.saturating_add(1);
                }
                Ok(Rows::counted(to.saturating_sub(from)))
            }
            (
                Some(_),
                "iterator" | "listIterator" | "stream" | "sequential" | "parallel" | "boxed"
                | "map" | "mapToObj" | "peek" | "sorted" | "collect" | "toList",
            ) => {
                let inner = object.ok_or_else(|| unsupported(self.text(node)))?;
                self.rows(&inner, locals)
            }
            (Some(_), "limit" | "skip") => {
                let inner = object.ok_or_else(|| unsupported(self.text(node)))?;
                let [count] = args.as_slice() else {
                    return Err(unsupported(self.text(node)));
                };
                let count = self.int_literal(count)?;
                let mut rows = self.rows(&inner, locals)?;
                if name == "limit" {
                    rows.limit(count);
                } else {
                    rows.skip(count);
                }
                Ok(rows)
            }
            (None | Some("this"), _) if args.is_empty() => self.local_method(name),
            _ => Err(unsupported(format!("call {}", self.text(node)))),
        }
    }

    /// Varargs factories: a single array argument is spread into its
    /// elements, otherwise each argument is one element.
    fn spread(
        &mut self,
        args: &[Node<'t>],
        locals: &Locals,
    ) -> Result<Rows, EvalFailure> {
        if let [only] = args {
            if matches!(only.kind(), "array_creation_expression" | "identifier") {
                return self.rows(only, locals);
            }
        }
        Ok(Rows::listed(args.iter().map(|arg| self.row(arg)).collect()))
    }

    fn local_method(&mut self, name: &str) -> Result<Rows, EvalFailure> {
        let body = self
            .class_body
            .ok_or_else(|| unsupported(format!("call {name}()")))?;

        let mut cursor = body.walk();
        let target = body.named_children(&mut cursor).find(|member| {
            member.kind() == "method_declaration"
                && member
                    .child_by_field_name("name")
                    .is_some_and(|n| self.text(&n) == name)
                && member
                    .child_by_field_name("parameters")
                    .is_some_and(|p| p.named_child_count() == 0)
        });

        match target {
            Some(method) => self.method(&method),
            None => Err(unsupported(format!("call {name}()"))),
        }
    }

    fn method_name(&self, invocation: &Node) -> &'s str {
        invocation
            .child_by_field_name("name")
            .map(|n| self.text(&n))
            .unwrap_or_default()
    }

    fn arguments(&self, node: &Node<'t>) -> Vec<Node<'t>> {
        let Some(arguments) = node.child_by_field_name("arguments") else {
            return Vec::new();
        };
        let mut cursor = arguments.walk();
        let args = arguments
            .named_children(&mut cursor)
            .filter(|c| !c.kind().ends_with("comment"))
            .collect();
        args
    }

    fn exception_name(&self, thrown: &Node) -> String {
        if thrown.kind() == "object_creation_expression" {
            if let Some(type_node) = thrown.child_by_field_name("type") {
                return self.text(&type_node).to_string();
            }
        }
        self.text(thrown).to_string()
    }
}

fn owner(receiver: &str) -> &str {
    receiver.rsplit('.').next().unwrap_or(receiver)
}

//! Token helpers shared by the text parsers

/// Parse one numeric token; `N/A` (unsolved residuals) reads as NaN
pub fn parse_number(token: &str) -> Option<f64> {
    if token.eq_ignore_ascii_case("n/a") {
        return Some(f64::NAN);
    }
    token.parse::<f64>().ok()
}

/// Value token of a data row
#[derive(Debug, Clone, PartialEq)]
pub enum RowValue<'a> {
    /// Bare token
    Bare(&'a str),
    /// Innermost parenthesized group `(x y z)`
    Group(Vec<&'a str>),
}

#[derive(Debug)]
enum Node<'a> {
    Bare(&'a str),
    Group(Vec<Node<'a>>),
}

/// Split a data row into values
///
/// A group that contains only bare tokens is one value; outer groups that
/// wrap other groups (`((px py pz) (vx vy vz))`) are transparent.
///
/// # Errors
///
/// A description of the imbalance when parentheses do not match.
pub fn split_row(line: &str) -> Result<Vec<RowValue<'_>>, String> {
    let mut stack: Vec<Vec<Node>> = vec![Vec::new()];
    let mut start: Option<usize> = None;

    for (i, c) in line.char_indices() {
        match c {
            '(' => {
                flush(line, &mut stack, &mut start, i);
                stack.push(Vec::new());
            }
            ')' => {
                flush(line, &mut stack, &mut start, i);
                if stack.len() < 2 {
                    return Err(format!("unbalanced ')' at column {}", i + 1));
                }
                let children = stack.pop().unwrap_or_default();
                if let Some(top) = stack.last_mut() {
                    top.push(Node::Group(children));
                }
            }
            c if c.is_whitespace() => flush(line, &mut stack, &mut start, i),
            _ => {
                if start.is_none() {
                    start = Some(i);
                }
            }
        }
    }
    flush(line, &mut stack, &mut start, line.len());

    if stack.len() != 1 {
        return Err("unbalanced '('".to_string());
    }

    let mut values = Vec::new();
    for node in stack.pop().unwrap_or_default() {
        flatten(node, &mut values);
    }
    Ok(values)
}

fn flush<'a>(line: &'a str, stack: &mut [Vec<Node<'a>>], start: &mut Option<usize>, end: usize) {
    if let Some(s) = start.take() {
        if let Some(top) = stack.last_mut() {
            top.push(Node::Bare(&line[s..end]));
        }
    }
}

fn flatten<'a>(node: Node<'a>, out: &mut Vec<RowValue<'a>>) {
    match node {
        Node::Bare(token) => out.push(RowValue::Bare(token)),
        Node::Group(children) => {
            if children.iter().all(|c| matches!(c, Node::Bare(_))) {
                let tokens = children
                    .into_iter()
                    .filter_map(|c| match c {
                        Node::Bare(t) => Some(t),
                        Node::Group(_) => None,
                    })
                    .collect();
                out.push(RowValue::Group(tokens));
            } else {
                for child in children {
                    flatten(child, out);
                }
            }
        }
    }
}

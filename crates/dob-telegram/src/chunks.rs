//! Splits HTML replies into pieces Telegram will accept.
//!
//! Telegram rejects messages over 4096 characters. Cuts never land inside a
//! tag or an entity, and tags still open at a cut are closed at the end of the
//! chunk and reopened at the start of the next one.

/// Byte budget per message. Bytes never undercount characters.
pub const SAFE_MESSAGE_LIMIT: usize = 4000;

#[derive(Clone, Debug)]
struct OpenTag {
    open: String,
    close: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Token<'a> {
    Tag(&'a str),
    /// One character or one `&...;` entity.
    Atom(&'a str),
}

impl<'a> Token<'a> {
    fn as_str(self) -> &'a str {
        match self {
            Token::Tag(s) | Token::Atom(s) => s,
        }
    }
}

pub fn split_html_chunks(html: &str, limit: usize) -> Vec<String> {
    if html.len() <= limit {
        return vec![html.to_string()];
    }
    let limit = limit.max(200);

    let mut out = Vec::new();
    let mut stack: Vec<OpenTag> = Vec::new();
    let mut chunk = String::new();

    for token in tokenize(html) {
        let piece = token.as_str();
        let needed = chunk.len() + piece.len() + close_len_after(&stack, token);
        if needed > limit && chunk.len() > open_len(&stack) {
            flush(&mut out, &mut chunk, &stack);
            reopen(&mut chunk, &stack);
        }
        chunk.push_str(piece);
        if let Token::Tag(tag) = token {
            apply_tag(&mut stack, tag);
        }
    }

    flush(&mut out, &mut chunk, &stack);
    out
}

fn tokenize(mut s: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    while let Some(c) = s.chars().next() {
        let len = match c {
            '<' => match s.find('>') {
                Some(end) => {
                    out.push(Token::Tag(&s[..=end]));
                    s = &s[end + 1..];
                    continue;
                }
                None => 1,
            },
            '&' => entity_len(s).unwrap_or(1),
            _ => c.len_utf8(),
        };
        out.push(Token::Atom(&s[..len]));
        s = &s[len..];
    }
    out
}

/// Length of a `&name;` or `&#123;` entity at the start of `s`.
fn entity_len(s: &str) -> Option<usize> {
    let end = s.char_indices().take(12).find(|(_, c)| *c == ';')?.0;
    let body = &s[1..end];
    let valid = !body.is_empty()
        && body
            .strip_prefix('#')
            .unwrap_or(body)
            .chars()
            .all(|c| c.is_ascii_alphanumeric());
    valid.then_some(end + 1)
}

fn tag_name(tag: &str) -> &str {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .split(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .next()
        .unwrap_or("")
}

fn apply_tag(stack: &mut Vec<OpenTag>, tag: &str) {
    let name = tag_name(tag);
    if name.is_empty() || tag.ends_with("/>") {
        return;
    }
    if tag.starts_with("</") {
        if let Some(pos) = stack.iter().rposition(|t| tag_name(&t.open) == name) {
            stack.truncate(pos);
        }
    } else {
        stack.push(OpenTag {
            open: tag.to_string(),
            close: format!("</{name}>"),
        });
    }
}

fn close_len(stack: &[OpenTag]) -> usize {
    stack.iter().map(|t| t.close.len()).sum()
}

fn open_len(stack: &[OpenTag]) -> usize {
    stack.iter().map(|t| t.open.len()).sum()
}

fn close_len_after(stack: &[OpenTag], token: Token<'_>) -> usize {
    match token {
        Token::Atom(_) => close_len(stack),
        Token::Tag(tag) => {
            let mut next = stack.to_vec();
            apply_tag(&mut next, tag);
            close_len(&next)
        }
    }
}

fn reopen(chunk: &mut String, stack: &[OpenTag]) {
    for t in stack {
        chunk.push_str(&t.open);
    }
}

fn flush(out: &mut Vec<String>, chunk: &mut String, stack: &[OpenTag]) {
    if chunk.len() <= open_len(stack) {
        // Nothing but reopened tags.
        chunk.clear();
        return;
    }
    let mut msg = std::mem::take(chunk);
    for t in stack.iter().rev() {
        msg.push_str(&t.close);
    }
    out.push(msg);
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Dot,
    Pipe,
    Dash,
    Arrow,
    Eq,
    Ne,
    RegexOp,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// Lexes over `char_indices`, not raw bytes: field values and string
/// literals may carry names in any script (§8 boundary case), and slicing
/// UTF-8 input by byte offset alone would split multi-byte characters.
pub(crate) fn lex(input: &str) -> Result<Vec<Spanned>, (usize, String)> {
    let mut chars: Vec<(usize, char)> = input.char_indices().collect();
    chars.push((input.len(), '\0'));
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < chars.len() - 1 {
        let (start, c) = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '(' => {
                out.push(Spanned { token: Token::LParen, position: start });
                i += 1;
            }
            ')' => {
                out.push(Spanned { token: Token::RParen, position: start });
                i += 1;
            }
            '[' => {
                out.push(Spanned { token: Token::LBracket, position: start });
                i += 1;
            }
            ']' => {
                out.push(Spanned { token: Token::RBracket, position: start });
                i += 1;
            }
            ':' => {
                out.push(Spanned { token: Token::Colon, position: start });
                i += 1;
            }
            ',' => {
                out.push(Spanned { token: Token::Comma, position: start });
                i += 1;
            }
            '.' => {
                out.push(Spanned { token: Token::Dot, position: start });
                i += 1;
            }
            '|' => {
                out.push(Spanned { token: Token::Pipe, position: start });
                i += 1;
            }
            '-' => {
                if chars[i + 1].1 == '>' {
                    out.push(Spanned { token: Token::Arrow, position: start });
                    i += 2;
                } else {
                    out.push(Spanned { token: Token::Dash, position: start });
                    i += 1;
                }
            }
            '=' => {
                if chars[i + 1].1 == '=' {
                    out.push(Spanned { token: Token::Eq, position: start });
                    i += 2;
                } else if chars[i + 1].1 == '~' {
                    out.push(Spanned { token: Token::RegexOp, position: start });
                    i += 2;
                } else {
                    return Err((start, "bare '=' is not an operator; did you mean '=='?".to_string()));
                }
            }
            '!' => {
                if chars[i + 1].1 == '=' {
                    out.push(Spanned { token: Token::Ne, position: start });
                    i += 2;
                } else {
                    return Err((start, "'!' must be followed by '='".to_string()));
                }
            }
            '<' => {
                if chars[i + 1].1 == '=' {
                    out.push(Spanned { token: Token::Le, position: start });
                    i += 2;
                } else {
                    out.push(Spanned { token: Token::Lt, position: start });
                    i += 1;
                }
            }
            '>' => {
                if chars[i + 1].1 == '=' {
                    out.push(Spanned { token: Token::Ge, position: start });
                    i += 2;
                } else {
                    out.push(Spanned { token: Token::Gt, position: start });
                    i += 1;
                }
            }
            '\'' | '"' => {
                let quote = c;
                i += 1;
                let mut value = String::new();
                loop {
                    match chars.get(i) {
                        None => return Err((start, "unterminated string literal".to_string())),
                        Some((_, ch)) if *ch == '\0' && i == chars.len() - 1 => {
                            return Err((start, "unterminated string literal".to_string()))
                        }
                        Some((_, ch)) if *ch == quote => {
                            i += 1;
                            break;
                        }
                        Some((_, ch)) => {
                            value.push(*ch);
                            i += 1;
                        }
                    }
                }
                out.push(Spanned { token: Token::Str(value), position: start });
            }
            _ if c.is_ascii_digit() => {
                let mut end = i + 1;
                while chars[end].1.is_ascii_digit() || chars[end].1 == '.' {
                    end += 1;
                }
                let text = &input[start..chars[end].0];
                let value: f64 = text
                    .parse()
                    .map_err(|_| (start, format!("'{text}' is not a valid number")))?;
                out.push(Spanned { token: Token::Num(value), position: start });
                i = end;
            }
            _ if c.is_alphabetic() || c == '_' => {
                let mut end = i + 1;
                while chars[end].1.is_alphanumeric() || chars[end].1 == '_' || chars[end].1 == '-' {
                    end += 1;
                }
                out.push(Spanned { token: Token::Ident(input[start..chars[end].0].to_string()), position: start });
                i = end;
            }
            _ => return Err((start, format!("unexpected character '{c}'"))),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_unicode_string_literals_without_corruption() {
        let tokens = lex("'東京-büro'").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Str("東京-büro".to_string()));
    }

    #[test]
    fn lexes_unicode_identifiers() {
        let tokens = lex("東京").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Ident("東京".to_string()));
    }
}

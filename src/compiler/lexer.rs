use crate::error::ExpressionError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(String),
    Identifier(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Comma,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Character offset of the token in the source text.
    pub position: usize,
}

/// Splits expression text into tokens, always terminated by `TokenKind::End`.
pub fn tokenize(text: &str) -> Result<Vec<Token>, ExpressionError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        // A dot directly after an operand is member access, otherwise it may
        // open a literal like `.5`.
        let after_operand = matches!(
            tokens.last().map(|t| &t.kind),
            Some(TokenKind::Identifier(_) | TokenKind::Number(_) | TokenKind::RParen | TokenKind::RBracket)
        );
        let starts_number = c.is_ascii_digit()
            || (c == '.' && !after_operand && chars.get(i + 1).is_some_and(char::is_ascii_digit));

        let kind = if starts_number {
            i = scan_number(&chars, i)?;
            TokenKind::Number(chars[start..i].iter().collect())
        } else if c.is_alphabetic() || c == '_' || c == '$' {
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '$') {
                i += 1;
            }
            TokenKind::Identifier(chars[start..i].iter().collect())
        } else {
            i += 1;
            match c {
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '^' => TokenKind::Caret,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                '.' => TokenKind::Dot,
                ',' => TokenKind::Comma,
                other => {
                    return Err(ExpressionError::Syntax {
                        position: start,
                        message: format!("Unexpected character '{}'", other),
                    });
                }
            }
        };
        tokens.push(Token {
            kind,
            position: start,
        });
    }

    tokens.push(Token {
        kind: TokenKind::End,
        position: chars.len(),
    });
    Ok(tokens)
}

// Returns the offset just past the literal starting at `start`.
fn scan_number(chars: &[char], start: usize) -> Result<usize, ExpressionError> {
    let mut i = start;
    let digits = |i: &mut usize| {
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            *i += 1;
        }
    };

    digits(&mut i);
    if chars.get(i) == Some(&'.') {
        i += 1;
        digits(&mut i);
    }
    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        if !chars.get(j).is_some_and(char::is_ascii_digit) {
            return Err(ExpressionError::Syntax {
                position: i,
                message: "Digit expected in exponent".to_string(),
            });
        }
        i = j;
        digits(&mut i);
    }
    Ok(i)
}

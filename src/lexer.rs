//! 过滤表达式的词法分析器
//!
//! 与常见的逐词切分不同, 这里的空白不会切分 token：字符被累积到缓冲区,
//! 只有括号、比较运算符和 `&&` / `||` 会把缓冲区刷出。
//! 因此 `id = 1` 与 `id=1` 得到相同的 token 序列。

use tracing::trace;

use crate::ast::Operator;
use crate::token::{Span, Token, TokenKind};

/// 对整段输入做词法分析
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

pub struct Lexer<'a> {
    input: &'a str,
    /// 输入字符串中的当前位置（字节索引）
    position: usize,
    /// 尚未刷出的字符
    buffer: String,
    /// 缓冲区内容在源文本中的起止位置
    buffer_start: Option<usize>,
    buffer_end: usize,
    /// 是否处于双引号内部
    in_quote: bool,
    /// 缓冲区内容是否来自双引号
    quoted: bool,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            position: 0,
            buffer: String::new(),
            buffer_start: None,
            buffer_end: 0,
            in_quote: false,
            quoted: false,
            tokens: Vec::new(),
        }
    }

    /// 返回当前位置的字符，不推进位置
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// 推进位置一个字符并返回该字符
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    /// 消费全部输入, 返回有序的 token 序列
    pub fn tokenize(mut self) -> Vec<Token> {
        while let Some(c) = self.bump() {
            let start = self.position - c.len_utf8();

            if self.in_quote {
                if c == '"' {
                    self.in_quote = false;
                    self.quoted = true;
                    self.buffer_end = self.position;
                } else {
                    self.push(c, start);
                }
                continue;
            }

            match c {
                '"' => {
                    self.in_quote = true;
                    self.buffer_start.get_or_insert(start);
                }
                c if c.is_whitespace() || c == '\'' => {}
                '(' => {
                    self.flush();
                    self.emit(TokenKind::LParen, Span::new(start, self.position));
                }
                ')' => {
                    self.flush();
                    self.emit(TokenKind::RParen, Span::new(start, self.position));
                }
                '=' => self.read_equals(start),
                '|' | '&' | '<' | '>' => self.read_operator_char(c, start),
                _ => {
                    // 单独的 `<` `>` `|` `&` 后面跟普通字符, 先把运算符刷出
                    if self.buffer_holds_operator() {
                        self.flush();
                    }
                    self.push(c, start);
                }
            }
        }
        self.flush();

        trace!(count = self.tokens.len(), "tokenized filter expression");
        self.tokens
    }

    /// 处理 `=`：与缓冲区中的 `<` `>` `!` 合并, 否则单独成为一个 token
    fn read_equals(&mut self, start: usize) {
        let op_start = self.buffer_start.unwrap_or(start);
        match self.buffer.chars().next() {
            Some('<') if !self.quoted => {
                self.clear();
                self.emit(TokenKind::Op(Operator::Lte), Span::new(op_start, self.position));
            }
            Some('>') if !self.quoted => {
                self.clear();
                self.emit(TokenKind::Op(Operator::Gte), Span::new(op_start, self.position));
            }
            _ if self.buffer.ends_with('!') && !self.quoted => {
                self.buffer.pop();
                self.buffer_end -= 1;
                let bang = self.buffer_end;
                self.flush();
                self.emit(TokenKind::Op(Operator::NotEq), Span::new(bang, self.position));
            }
            _ => {
                self.flush();
                self.emit(TokenKind::Op(Operator::Eq), Span::new(start, self.position));
            }
        }
    }

    /// 处理 `|` `&` `<` `>`：两个连续的 `|` 或 `&` 组成逻辑运算符
    fn read_operator_char(&mut self, c: char, start: usize) {
        match self.buffer.chars().next() {
            None if !self.quoted => self.push(c, start),
            Some('|') if c == '|' && !self.quoted => {
                let op_start = self.buffer_start.unwrap_or(start);
                self.clear();
                self.emit(TokenKind::Or, Span::new(op_start, self.position));
            }
            Some('&') if c == '&' && !self.quoted => {
                let op_start = self.buffer_start.unwrap_or(start);
                self.clear();
                self.emit(TokenKind::And, Span::new(op_start, self.position));
            }
            _ => {
                self.flush();
                self.push(c, start);
            }
        }
    }

    fn buffer_holds_operator(&self) -> bool {
        !self.quoted && matches!(self.buffer.as_str(), "<" | ">" | "|" | "&")
    }

    fn push(&mut self, c: char, start: usize) {
        self.buffer_start.get_or_insert(start);
        self.buffer.push(c);
        self.buffer_end = self.position;
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.buffer_start = None;
        self.quoted = false;
    }

    /// 把缓冲区刷出为一个 token; 空的引号字符串也会产生 token
    fn flush(&mut self) {
        if self.buffer.is_empty() && !self.quoted {
            self.buffer_start = None;
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        let kind = if self.quoted {
            TokenKind::Quoted(text)
        } else {
            match text.as_str() {
                "<" => TokenKind::Op(Operator::Lt),
                ">" => TokenKind::Op(Operator::Gt),
                _ => TokenKind::Literal(text),
            }
        };
        let start = self.buffer_start.take().unwrap_or(self.buffer_end);
        self.quoted = false;
        self.emit(kind, Span::new(start, self.buffer_end));
    }

    fn emit(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn lit(s: &str) -> TokenKind {
        TokenKind::Literal(s.to_string())
    }

    #[test]
    fn test_simple_comparison() {
        assert_eq!(
            kinds("id=1"),
            vec![lit("id"), TokenKind::Op(Operator::Eq), lit("1")]
        );
    }

    #[test]
    fn test_whitespace_is_insignificant() {
        assert_eq!(kinds("  id =  1 "), kinds("id=1"));
        assert_eq!(
            kinds("name = John Smith"),
            vec![lit("name"), TokenKind::Op(Operator::Eq), lit("JohnSmith")]
        );
    }

    #[test]
    fn test_whitespace_only_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \n\t ").is_empty());
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            kinds("a=1&&b=2||c=3"),
            vec![
                lit("a"),
                TokenKind::Op(Operator::Eq),
                lit("1"),
                TokenKind::And,
                lit("b"),
                TokenKind::Op(Operator::Eq),
                lit("2"),
                TokenKind::Or,
                lit("c"),
                TokenKind::Op(Operator::Eq),
                lit("3"),
            ]
        );
    }

    #[test]
    fn test_all_comparison_operators() {
        let ops: Vec<_> = ["a<1", "a<=1", "a>1", "a>=1", "a=1", "a!=1"]
            .iter()
            .map(|input| kinds(input)[1].clone())
            .collect();
        assert_eq!(
            ops,
            vec![
                TokenKind::Op(Operator::Lt),
                TokenKind::Op(Operator::Lte),
                TokenKind::Op(Operator::Gt),
                TokenKind::Op(Operator::Gte),
                TokenKind::Op(Operator::Eq),
                TokenKind::Op(Operator::NotEq),
            ]
        );
    }

    #[test]
    fn test_spaced_operators() {
        assert_eq!(
            kinds("date <= 2019-09-09 && date > 2019-08-08"),
            vec![
                lit("date"),
                TokenKind::Op(Operator::Lte),
                lit("2019-09-09"),
                TokenKind::And,
                lit("date"),
                TokenKind::Op(Operator::Gt),
                lit("2019-08-08"),
            ]
        );
        assert_eq!(
            kinds("a != 1"),
            vec![lit("a"), TokenKind::Op(Operator::NotEq), lit("1")]
        );
    }

    #[test]
    fn test_parentheses_flush_buffer() {
        assert_eq!(
            kinds("(a=1)||(b=2)"),
            vec![
                TokenKind::LParen,
                lit("a"),
                TokenKind::Op(Operator::Eq),
                lit("1"),
                TokenKind::RParen,
                TokenKind::Or,
                TokenKind::LParen,
                lit("b"),
                TokenKind::Op(Operator::Eq),
                lit("2"),
                TokenKind::RParen,
            ]
        );
    }

    #[test]
    fn test_quoted_literal_keeps_spaces() {
        assert_eq!(
            kinds(r#"create_date>="2020-02-02 12:12:12""#),
            vec![
                lit("create_date"),
                TokenKind::Op(Operator::Gte),
                TokenKind::Quoted("2020-02-02 12:12:12".to_string()),
            ]
        );
    }

    #[test]
    fn test_quoted_literal_keeps_operator_characters() {
        assert_eq!(
            kinds(r#"title="a && (b) || c=d""#),
            vec![
                lit("title"),
                TokenKind::Op(Operator::Eq),
                TokenKind::Quoted("a && (b) || c=d".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_quoted_literal() {
        assert_eq!(
            kinds(r#"name="""#),
            vec![lit("name"), TokenKind::Op(Operator::Eq), TokenKind::Quoted(String::new())]
        );
    }

    #[test]
    fn test_single_quotes_are_dropped() {
        assert_eq!(kinds("name='budi'"), kinds("name=budi"));
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("id >= 10");
        assert_eq!(tokens[0].span, Span::new(0, 2));
        assert_eq!(tokens[1].span, Span::new(3, 5));
        assert_eq!(tokens[2].span, Span::new(6, 8));

        let tokens = tokenize(r#"a="x y""#);
        assert_eq!(tokens[2].span, Span::new(2, 7));
        assert!(tokens[2].is_quoted());
    }
}

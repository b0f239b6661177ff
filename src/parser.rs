//! 过滤表达式的语法分析器
//!
//! ## 解析流程
//!
//! ```text
//! parse()
//!   └─ parse_group() (单次从左到右扫描)
//!        ├─ "("       → 递归 parse_group(), 结果作为分支节点
//!        ├─ ")"       → 结束当前分组
//!        ├─ && / ||   → 记录待定的逻辑运算符, 丢弃未完成的叶子
//!        ├─ 比较运算符 → 附加到未完成的叶子
//!        └─ 其他 token → 没有未完成的叶子时作为属性名,
//!                        否则作为值并完成叶子
//! ```
//!
//! 解析永远不会失败：不完整的输入会得到一棵部分的条件树。
//!
//! ## 示例
//!
//! ```text
//! id=1 && member_id=2 && (division=engineering || division=finance)
//!
//! branch
//!   ├─ id = 1
//!   ├─ AND member_id = 2
//!   └─ AND branch
//!            ├─ division = engineering
//!            └─ OR division = finance
//! ```

use tracing::debug;

use crate::ast::{Attribute, Condition, LogicalOperator};
use crate::convert::infer_quoted_type;
use crate::token::{Token, TokenKind};

/// 解析 token 序列
pub fn parse(tokens: &[Token]) -> Condition {
    Parser::new(tokens).parse()
}

pub struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// 当前游标位置, 即已消费的 token 数量
    pub fn position(&self) -> usize {
        self.position
    }

    /// 返回当前 token，不推进位置
    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.position)
    }

    /// 返回当前 token 并推进位置
    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek()?;
        self.position += 1;
        Some(token)
    }

    /// 构建根分支
    ///
    /// 没有任何完整叶子时返回 [`Condition::empty`]。
    pub fn parse(&mut self) -> Condition {
        let mut children = Vec::new();
        // 多余的 ")" 只结束当前分组, 根节点继续读取剩余 token
        while self.peek().is_some() {
            children.extend(self.parse_group());
        }

        if children.is_empty() {
            debug!(tokens = self.tokens.len(), "no complete comparison in filter");
            return Condition::empty();
        }
        debug!(children = children.len(), "parsed filter");
        Condition::branch(None, children)
    }

    /// 读取直到匹配的 ")" 或输入结束, 返回该分组的子节点
    fn parse_group(&mut self) -> Vec<Condition> {
        let mut children = Vec::new();
        let mut pending: Option<LogicalOperator> = None;
        let mut leaf: Option<Attribute> = None;

        while let Some(token) = self.advance() {
            match &token.kind {
                TokenKind::RParen => break,
                TokenKind::LParen => {
                    let group = self.parse_group();
                    // 空分组 "()" 直接丢弃
                    if !group.is_empty() {
                        children.push(Condition::branch(pending, group));
                    }
                    leaf = None;
                }
                TokenKind::And => {
                    pending = Some(LogicalOperator::And);
                    leaf = None;
                }
                TokenKind::Or => {
                    pending = Some(LogicalOperator::Or);
                    leaf = None;
                }
                TokenKind::Op(op) => {
                    if let Some(attribute) = leaf.as_mut() {
                        attribute.operator = *op;
                    }
                }
                TokenKind::Literal(text) | TokenKind::Quoted(text) => match leaf.take() {
                    None => leaf = Some(Attribute::named(text.as_str())),
                    Some(mut attribute) => {
                        attribute.value = text.clone();
                        if token.is_quoted() {
                            attribute.value_type = Some(infer_quoted_type(text));
                        }
                        children.push(Condition::leaf(pending, attribute));
                    }
                },
            }
        }

        children
    }
}

//! 条件树的数据模型，由解析器构建，被求值器、蕴含判断和 SQL 编译器共享

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::convert::infer_value_type;
use crate::error::Error;

/// 条件树节点, 叶子或分支
///
/// `operator` 表示与前一个兄弟节点的逻辑关系, 分支的第一个子节点忽略该字段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_logical_operator"
    )]
    pub operator: Option<LogicalOperator>,
    #[serde(flatten)]
    pub node: Node,
}

/// 节点内容：叶子只持有属性, 分支只持有子条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    #[serde(rename = "attribute")]
    Leaf(Attribute),
    #[serde(rename = "conditions")]
    Branch(Vec<Condition>),
}

impl Condition {
    pub fn leaf(operator: Option<LogicalOperator>, attribute: Attribute) -> Self {
        Self {
            operator,
            node: Node::Leaf(attribute),
        }
    }

    pub fn branch(operator: Option<LogicalOperator>, conditions: Vec<Condition>) -> Self {
        Self {
            operator,
            node: Node::Branch(conditions),
        }
    }

    /// 空输入的退化结果：一个没有名称、没有值的叶子
    pub fn empty() -> Self {
        Self::leaf(None, Attribute::default())
    }

    pub fn attribute(&self) -> Option<&Attribute> {
        match &self.node {
            Node::Leaf(attribute) => Some(attribute),
            Node::Branch(_) => None,
        }
    }

    pub fn children(&self) -> &[Condition] {
        match &self.node {
            Node::Leaf(_) => &[],
            Node::Branch(children) => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.node, Node::Leaf(_))
    }

    /// 与前一个兄弟节点的逻辑关系, 缺省为 AND
    pub fn logical_operator(&self) -> LogicalOperator {
        self.operator.unwrap_or_default()
    }

    /// 深度优先收集所有叶子属性
    pub fn leaves(&self) -> Vec<&Attribute> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Attribute>) {
        match &self.node {
            Node::Leaf(attribute) => out.push(attribute),
            Node::Branch(children) => {
                for child in children {
                    child.collect_leaves(out);
                }
            }
        }
    }
}

/// 单个比较条件, 例如 `member_id >= 45`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator,
            value: value.into(),
            value_type: None,
        }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    /// 声明的类型, 未声明时根据字面值推断
    pub fn value_type(&self) -> ValueType {
        self.value_type
            .unwrap_or_else(|| infer_value_type(&self.value))
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

/// 比较运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Operator {
    #[default]
    Eq, // =
    NotEq,     // !=
    Lt,        // <
    Lte,       // <=
    Gt,        // >
    Gte,       // >=
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
    Like,      // LIKE
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Like => "LIKE",
        }
    }

    /// IN / NOT IN
    pub fn is_set_membership(&self) -> bool {
        matches!(self, Operator::In | Operator::NotIn)
    }

    /// IS NULL / IS NOT NULL, 不带值
    pub fn is_nullary(&self) -> bool {
        matches!(self, Operator::IsNull | Operator::IsNotNull)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // 允许 "not  in" 这类多余空白
        let normalized = s
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        match normalized.as_str() {
            "=" => Ok(Operator::Eq),
            "!=" | "<>" => Ok(Operator::NotEq),
            "<" => Ok(Operator::Lt),
            "<=" => Ok(Operator::Lte),
            ">" => Ok(Operator::Gt),
            ">=" => Ok(Operator::Gte),
            "IN" => Ok(Operator::In),
            "NOT IN" => Ok(Operator::NotIn),
            "IS NULL" => Ok(Operator::IsNull),
            "IS NOT NULL" => Ok(Operator::IsNotNull),
            "LIKE" => Ok(Operator::Like),
            _ => Err(Error::InvalidOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for Operator {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().is_empty() {
            return Ok(Operator::default());
        }
        value.parse()
    }
}

impl From<Operator> for &'static str {
    fn from(op: Operator) -> Self {
        op.as_str()
    }
}

/// 逻辑运算符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum LogicalOperator {
    #[default]
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }

    pub fn apply(&self, left: bool, right: bool) -> bool {
        match self {
            LogicalOperator::And => left && right,
            LogicalOperator::Or => left || right,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogicalOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" | "&&" => Ok(LogicalOperator::And),
            "OR" | "||" => Ok(LogicalOperator::Or),
            _ => Err(Error::InvalidLogicalOperator(s.to_string())),
        }
    }
}

impl TryFrom<String> for LogicalOperator {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LogicalOperator> for &'static str {
    fn from(op: LogicalOperator) -> Self {
        op.as_str()
    }
}

/// 空字符串视为未设置
fn deserialize_logical_operator<'de, D>(deserializer: D) -> Result<Option<LogicalOperator>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// 字面值类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Numeric,
    Alphanumeric,
    Date,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Numeric => "numeric",
            ValueType::Alphanumeric => "alphanumeric",
            ValueType::Date => "date",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SQL 编译请求：输出字段、条件列表和分页排序信息
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BaseCondition {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub footer: Footer,
}

impl BaseCondition {
    pub fn new(conditions: Vec<Condition>) -> Self {
        Self {
            conditions,
            ..Default::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }
}

/// 分页与排序
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Footer {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub limit: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortKey>,
}

/// 排序字段, 顺序由调用方决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortKey {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(Error::InvalidSortDirection(s.to_string())),
        }
    }
}

impl TryFrom<String> for SortDirection {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SortDirection> for &'static str {
    fn from(direction: SortDirection) -> Self {
        direction.as_str()
    }
}

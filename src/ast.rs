//! 过滤请求与编译结果的数据模型

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// 一次"自定义查询"请求的完整载荷
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomQueryRequest {
    /// 有序的过滤条目, 与连接词按位置配对
    #[serde(default, deserialize_with = "lenient_entries")]
    pub filters: Vec<FilterEntry>,
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub connectives: Vec<Connective>,
    /// 被查询的模型名, 仅在需要解析关联时使用
    #[serde(default, deserialize_with = "lenient")]
    pub model: Option<String>,
}

// 以下反序列化辅助函数保证单个畸形条目不会让整个请求失败:
// 类型不符的部分变成 `None`/默认值, 之后由编译器跳过。

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = JsonValue::deserialize(deserializer)?;
    Ok(serde_json::from_value(raw).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// 无法解析的条目变成空条目
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<FilterEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let JsonValue::Array(items) = JsonValue::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

/// 一个用户提交的过滤条目: 过滤条件 + 目标字段
///
/// 两者任一缺失时, 编译器会静默跳过该条目。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FilterEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub filter: Option<FilterTerm>,
    #[serde(default, deserialize_with = "lenient")]
    pub field: Option<FieldDescriptor>,
}

impl FilterEntry {
    pub fn new(filter: FilterTerm, field: FieldDescriptor) -> Self {
        Self {
            filter: Some(filter),
            field: Some(field),
        }
    }
}

/// 比较运算符与操作数
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterTerm {
    #[serde(default, deserialize_with = "lenient")]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: FilterValue,
}

impl FilterTerm {
    pub fn new(operator: &str, value: impl Into<FilterValue>) -> Self {
        Self {
            operator: Some(operator.to_string()),
            value: value.into(),
        }
    }
}

/// 目标字段及其类型
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub field_name: String,
    /// 未知或缺失的类型标签反序列化为 `None`
    #[serde(default, deserialize_with = "lenient_field_type")]
    pub field_type: Option<FieldType>,
}

impl FieldDescriptor {
    pub fn new(field_name: &str, field_type: FieldType) -> Self {
        Self {
            field_name: field_name.to_string(),
            field_type: Some(field_type),
        }
    }
}

fn lenient_field_type<'de, D>(deserializer: D) -> Result<Option<FieldType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = JsonValue::deserialize(deserializer)?;
    Ok(raw.as_str().and_then(FieldType::parse))
}

/// 字段类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Date,
    Boolean,
    Entity,
}

impl FieldType {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "string" => Some(FieldType::String),
            "number" => Some(FieldType::Number),
            "date" => Some(FieldType::Date),
            "boolean" => Some(FieldType::Boolean),
            "entity" => Some(FieldType::Entity),
            _ => None,
        }
    }
}

/// 操作数: 单值、值列表或区间 `{ start, end }`
///
/// 其他形状(例如对象)落入 `Other`, 该条目会被跳过。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    // List 必须排在 Range 之前: 结构体也能从数组反序列化
    List(Vec<Literal>),
    Range {
        start: Literal,
        #[serde(default)]
        end: Option<Literal>,
    },
    Scalar(Literal),
    Other(JsonValue),
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::Scalar(Literal::Null)
    }
}

impl FilterValue {
    pub fn range(start: impl Into<Literal>, end: impl Into<Literal>) -> Self {
        FilterValue::Range {
            start: start.into(),
            end: Some(end.into()),
        }
    }

    /// 拆成 `(value1, value2)`: 只有区间才带第二个边界
    pub fn bounds(&self) -> (&Literal, Option<&Literal>) {
        match self {
            FilterValue::Range { start, end } => (start, end.as_ref()),
            FilterValue::List(values) => (values.first().unwrap_or(&Literal::Null), None),
            FilterValue::Scalar(value) => (value, None),
            FilterValue::Other(_) => (&Literal::Null, None),
        }
    }

    /// 无法作为操作数使用的值
    pub fn is_unusable(&self) -> bool {
        matches!(self, FilterValue::Other(_))
    }

    /// 强制转换为值列表
    pub fn to_list(&self) -> Vec<Literal> {
        match self {
            FilterValue::List(values) => values.clone(),
            FilterValue::Range { start, end } => {
                std::iter::once(start.clone()).chain(end.clone()).collect()
            }
            FilterValue::Scalar(Literal::Null) => Vec::new(),
            FilterValue::Scalar(value) => vec![value.clone()],
            FilterValue::Other(_) => Vec::new(),
        }
    }
}

macro_rules! scalar_filter_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for FilterValue {
                fn from(value: $ty) -> Self {
                    FilterValue::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_filter_value!(Literal, &str, String, i64, f64, bool);

impl From<Vec<Literal>> for FilterValue {
    fn from(values: Vec<Literal>) -> Self {
        FilterValue::List(values)
    }
}

/// 字面量值
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// 仅由日期构建器产生
    DateTime(NaiveDateTime),
}

impl Literal {
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Literal::Integer(n) => Some(*n as f64),
            Literal::Float(f) if f.is_finite() => Some(*f),
            Literal::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Integer(n) => Some(*n),
            Literal::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Literal::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// 文本形式, `Null` 没有文本形式
    pub fn as_text(&self) -> Option<String> {
        match self {
            Literal::Null => None,
            Literal::Bool(b) => Some(b.to_string()),
            Literal::Integer(n) => Some(n.to_string()),
            Literal::Float(f) => Some(f.to_string()),
            Literal::Text(s) => Some(s.clone()),
            Literal::DateTime(dt) => Some(dt.to_string()),
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Integer(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

impl From<NaiveDateTime> for Literal {
    fn from(value: NaiveDateTime) -> Self {
        Literal::DateTime(value)
    }
}

/// 相邻两个子句之间的逻辑连接词
///
/// 无法识别的字符串(例如 `"xor"`)按 `Or` 处理, `Or` 也是缺省值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(from = "JsonValue", rename_all = "lowercase")]
pub enum Connective {
    And,
    #[default]
    Or,
}

impl Connective {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "and" => Connective::And,
            _ => Connective::Or,
        }
    }

    /// 将两个子句合并为一个二元节点
    pub fn combine(self, left: Clause, right: Clause) -> Clause {
        match self {
            Connective::And => Clause::And(Box::new(left), Box::new(right)),
            Connective::Or => Clause::Or(Box::new(left), Box::new(right)),
        }
    }
}

impl From<JsonValue> for Connective {
    fn from(raw: JsonValue) -> Self {
        raw.as_str().map_or(Connective::Or, Connective::parse)
    }
}

impl From<String> for Connective {
    fn from(raw: String) -> Self {
        Connective::parse(&raw)
    }
}

impl From<&str> for Connective {
    fn from(raw: &str) -> Self {
        Connective::parse(raw)
    }
}

/// 编译后的布尔子句树
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Clause {
    And(Box<Clause>, Box<Clause>),
    Or(Box<Clause>, Box<Clause>),
    /// 叶子节点: 针对单个字段的谓词
    Predicate(Predicate),
}

impl Clause {
    pub fn predicate(field: &str, comparison: Comparison) -> Self {
        Clause::Predicate(Predicate {
            field: field.to_string(),
            comparison,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Predicate {
    pub field: String,
    pub comparison: Comparison,
}

/// 谓词的比较方式
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Comparison {
    Eq(Literal),
    Ne(Literal),
    Gt(Literal),
    Gte(Literal),
    Lt(Literal),
    Lte(Literal),
    /// 闭区间
    Between(Literal, Literal),
    In(Vec<Literal>),
    NotIn(Vec<Literal>),
    IsNull,
    IsNotNull,
    /// 大小写不敏感的模式匹配
    Like { pattern: LikePattern, negated: bool },
    /// 提取日期部分后做相等比较
    DatePart { part: DatePart, value: i64 },
}

/// 大小写不敏感匹配的模式, 内容为未转义的原始文本
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LikePattern {
    Contains(String),
    StartsWith(String),
    EndsWith(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    Day,
    Month,
}

/// 关联模型的引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelRef {
    pub name: String,
    pub table: String,
}

/// 预加载描述: 通过 id 集合限制被关联的行
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludeDescriptor {
    pub model: ModelRef,
    #[serde(rename = "as")]
    pub alias: String,
    /// 关联表上指向主表 id 的列
    pub foreign_key: String,
    pub ids: Vec<Literal>,
}

/// 编译结果
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStructure {
    /// 折叠后的单一根节点; 所有条目都被路由到 include 时为 `None`
    pub where_options: Option<Clause>,
    /// 为空时始终是 `None`, 而不是空列表
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_options: Option<Vec<IncludeDescriptor>>,
}

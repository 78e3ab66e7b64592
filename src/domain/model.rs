use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// 模板中出現的純量值：參數、衍生值、答案與干擾選項都使用同一型別
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
        }
    }
}

/// 數字的標準字串形式：整數不帶小數點，極大/極小值改用指數表示
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let magnitude = n.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", n);
        return match formatted.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{}e+{}", mantissa, exp),
            _ => formatted,
        };
    }
    if n.fract() == 0.0 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// 評估表達式時可見的變數集合
pub type Scope = HashMap<String, Value>;

/// 保留宣告順序的映射 (JSON object 的 key 順序即取樣/計算順序)
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 插入或覆寫；覆寫時保留原本的位置
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut map = OrderedMap::new();
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
    }
}

/// 參數取樣規則。欄位保持原始形狀，是否合法在取樣時才判斷
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<Value>,
}

impl ParamSpec {
    pub fn discrete(values: Vec<Value>) -> Self {
        Self {
            values: Some(values),
            ..Self::default()
        }
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            ..Self::default()
        }
    }

    pub fn with_exclude(mut self, exclude: Vec<Value>) -> Self {
        self.exclude = exclude;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub stem: String,
    #[serde(default)]
    pub params: OrderedMap<Option<ParamSpec>>,
    #[serde(default)]
    pub derived: OrderedMap<String>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub answer: Option<Value>,
    #[serde(default)]
    pub distractors: Vec<Value>,
}

impl Template {
    pub fn label(&self) -> &str {
        self.id.as_deref().unwrap_or("<anonymous>")
    }
}

/// 單次生成的結果，產生後不再修改
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedItem {
    pub stem: String,
    pub params: OrderedMap<Value>,
    pub derived: OrderedMap<Value>,
    pub answer: Value,
    pub distractors: Vec<Value>,
}

impl GeneratedItem {
    /// 參數與衍生值合併後的變數集合 (衍生值同名時覆蓋參數)
    pub fn scope(&self) -> Scope {
        self.params
            .iter()
            .chain(self.derived.iter())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

/// 題庫檔中的一筆：`{ "id": ..., "template": {...} }`，其他欄位忽略。
/// 模板先保留原始 JSON，單筆格式錯誤不影響同檔其他題目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub template: Option<serde_json::Value>,
}

impl BankEntry {
    pub fn parse_template(&self) -> std::result::Result<Option<Template>, serde_json::Error> {
        match &self.template {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(raw) => Template::deserialize(raw).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(format_number(3.0), "3");
        assert_eq!(format_number(-2.0), "-2");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-0.0), "0");
    }

    #[test]
    fn test_params_keep_declaration_order() {
        let json = r#"{"zeta": {"min": 1, "max": 2}, "alpha": {"values": ["A"]}, "mid": {"min": 0.5}}"#;
        let params: OrderedMap<Option<ParamSpec>> = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_template_deserialize() {
        let json = r#"{
            "stem": "What is {{x}} * 2?",
            "params": {"x": {"min": 1, "max": 3, "exclude": [2]}},
            "constraints": ["x != 2"],
            "answer": "x*2",
            "distractors": ["x*3", 7, true]
        }"#;
        let template: Template = serde_json::from_str(json).unwrap();
        assert_eq!(template.stem, "What is {{x}} * 2?");
        let spec = template.params.get("x").unwrap().as_ref().unwrap();
        assert_eq!(spec.min, Some(1.0));
        assert_eq!(spec.exclude, vec![Value::Number(2.0)]);
        assert_eq!(template.answer, Some(Value::Text("x*2".to_string())));
        assert_eq!(template.distractors[1], Value::Number(7.0));
        assert_eq!(template.distractors[2], Value::Bool(true));
        assert_eq!(template.label(), "<anonymous>");
    }

    #[test]
    fn test_null_param_spec_is_kept() {
        let template: Template =
            serde_json::from_str(r#"{"stem": "", "params": {"x": null}}"#).unwrap();
        assert_eq!(template.params.get("x"), Some(&None));
    }

    #[test]
    fn test_bank_entry_keeps_malformed_template_for_later() {
        let entries: Vec<BankEntry> = serde_json::from_str(
            r#"[
                {"id": "ok", "template": {"stem": "s", "answer": 1}},
                {"id": "bad", "template": {"stem": "s", "params": {"x": {"values": [1, null]}}, "answer": "x"}},
                {"id": "none"}
            ]"#,
        )
        .unwrap();
        assert_eq!(entries.len(), 3);
        assert!(entries[0].parse_template().unwrap().is_some());
        assert!(entries[1].parse_template().is_err());
        assert!(entries[2].parse_template().unwrap().is_none());
    }

    #[test]
    fn test_item_serializes_integral_numbers_as_integers() {
        let item = GeneratedItem {
            stem: "2".to_string(),
            params: [("x", Value::Number(1.0))].into_iter().collect(),
            derived: OrderedMap::new(),
            answer: Value::Number(2.0),
            distractors: vec![Value::Number(2.5), Value::from("B")],
        };
        let json = serde_json::to_string(&item).unwrap();
        assert_eq!(
            json,
            r#"{"stem":"2","params":{"x":1},"derived":{},"answer":2,"distractors":[2.5,"B"]}"#
        );
    }
}

//! School 表单：绑定、清洗、校验，以及渲染模板用的上下文

use super::models::{NewSchool, School, SchoolChanges, SchoolField, MAX_FIELD_LENGTH};
use serde::Serialize;
use std::collections::HashMap;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const NULL_CHARACTER_MESSAGE: &str = "Null characters are not allowed.";

/// 绑定了一组字段的表单
#[derive(Debug, Clone)]
pub struct SchoolForm {
    fields: Vec<SchoolField>,
    values: HashMap<SchoolField, String>,
    errors: HashMap<SchoolField, Vec<String>>,
    bound: bool,
}

/// 模板中单个字段的渲染数据
#[derive(Debug, Serialize)]
pub struct BoundField {
    pub name: &'static str,
    pub label: &'static str,
    pub value: String,
    pub errors: Vec<String>,
    pub max_length: usize,
}

/// 模板中的 `form`
#[derive(Debug, Serialize)]
pub struct FormContext {
    pub is_bound: bool,
    pub fields: Vec<BoundField>,
    pub error_count: usize,
}

impl SchoolForm {
    /// 空表单（创建页 GET）
    pub fn unbound(fields: &[SchoolField]) -> Self {
        Self {
            fields: fields.to_vec(),
            values: HashMap::new(),
            errors: HashMap::new(),
            bound: false,
        }
    }

    /// 以现有记录为初始值的表单（更新页 GET）
    pub fn for_instance(fields: &[SchoolField], school: &School) -> Self {
        let values = fields
            .iter()
            .map(|field| (*field, school.field(*field).to_string()))
            .collect();
        Self {
            fields: fields.to_vec(),
            values,
            errors: HashMap::new(),
            bound: false,
        }
    }

    /// 绑定提交的数据并校验；不在 `fields` 中的键被忽略
    pub fn bind(fields: &[SchoolField], data: &HashMap<String, String>) -> Self {
        let mut form = Self {
            fields: fields.to_vec(),
            values: HashMap::new(),
            errors: HashMap::new(),
            bound: true,
        };

        for field in fields {
            let raw = data.get(field.as_str()).map(String::as_str).unwrap_or("");
            let cleaned = raw.trim().to_string();
            let errors = Self::validate(&cleaned);
            if !errors.is_empty() {
                form.errors.insert(*field, errors);
            }
            form.values.insert(*field, cleaned);
        }
        form
    }

    fn validate(value: &str) -> Vec<String> {
        let mut errors = Vec::new();
        if value.is_empty() {
            errors.push(REQUIRED_MESSAGE.to_string());
            return errors;
        }
        if value.contains('\0') {
            errors.push(NULL_CHARACTER_MESSAGE.to_string());
        }
        let length = value.chars().count();
        if length > MAX_FIELD_LENGTH {
            errors.push(format!(
                "Ensure this value has at most {} characters (it has {}).",
                MAX_FIELD_LENGTH, length
            ));
        }
        errors
    }

    pub fn is_valid(&self) -> bool {
        self.bound && self.errors.is_empty()
    }

    pub fn errors(&self, field: SchoolField) -> &[String] {
        self.errors.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// 校验通过后的字段值
    pub fn cleaned(&self, field: SchoolField) -> Option<&str> {
        if !self.is_valid() {
            return None;
        }
        self.values.get(&field).map(String::as_str)
    }

    /// 全字段表单转换为新建记录
    pub fn to_new_school(&self) -> Option<NewSchool> {
        Some(NewSchool {
            name: self.cleaned(SchoolField::Name)?.to_string(),
            principal: self.cleaned(SchoolField::Principal)?.to_string(),
            location: self.cleaned(SchoolField::Location)?.to_string(),
        })
    }

    /// 只包含表单声明字段的部分更新
    pub fn to_changes(&self) -> Option<SchoolChanges> {
        let mut changes = SchoolChanges::default();
        for field in &self.fields {
            changes.set(*field, self.cleaned(*field)?.to_string());
        }
        Some(changes)
    }

    pub fn context(&self) -> FormContext {
        let fields = self
            .fields
            .iter()
            .map(|field| BoundField {
                name: field.as_str(),
                label: field.label(),
                value: self.values.get(field).cloned().unwrap_or_default(),
                errors: self.errors(*field).to_vec(),
                max_length: MAX_FIELD_LENGTH,
            })
            .collect();

        FormContext {
            is_bound: self.bound,
            fields,
            error_count: self.errors.values().map(Vec::len).sum(),
        }
    }
}

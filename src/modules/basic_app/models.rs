use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// School 表名（沿用 `<app>_<model>` 命名）
pub const SCHOOL_TABLE: &str = "basic_app_school";

/// 文本字段最大长度（按字符计）
pub const MAX_FIELD_LENGTH: usize = 256;

/// 学校实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct School {
    /// 主键，由存储层在插入时分配，之后不可变
    pub id: i64,
    pub name: String,
    pub principal: String,
    pub location: String,
}

impl School {
    /// 读取某个字段的当前值
    pub fn field(&self, field: SchoolField) -> &str {
        match field {
            SchoolField::Name => &self.name,
            SchoolField::Principal => &self.principal,
            SchoolField::Location => &self.location,
        }
    }
}

/// 新建学校所需的全部字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,
    pub principal: String,
    pub location: String,
}

impl NewSchool {
    pub fn into_school(self, id: i64) -> School {
        School {
            id,
            name: self.name,
            principal: self.principal,
            location: self.location,
        }
    }
}

/// 部分更新：`None` 表示该字段保持不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolChanges {
    pub name: Option<String>,
    pub principal: Option<String>,
    pub location: Option<String>,
}

impl SchoolChanges {
    pub fn set(&mut self, field: SchoolField, value: String) {
        match field {
            SchoolField::Name => self.name = Some(value),
            SchoolField::Principal => self.principal = Some(value),
            SchoolField::Location => self.location = Some(value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.principal.is_none() && self.location.is_none()
    }

    /// 把变更应用到已有记录上
    pub fn apply_to(&self, school: &mut School) {
        if let Some(name) = &self.name {
            school.name = name.clone();
        }
        if let Some(principal) = &self.principal {
            school.principal = principal.clone();
        }
        if let Some(location) = &self.location {
            school.location = location.clone();
        }
    }
}

/// School 上可以通过表单读写的字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolField {
    Name,
    Principal,
    Location,
}

impl SchoolField {
    /// 声明顺序
    pub const ALL: [SchoolField; 3] = [SchoolField::Name, SchoolField::Principal, SchoolField::Location];

    pub fn as_str(&self) -> &'static str {
        match self {
            SchoolField::Name => "name",
            SchoolField::Principal => "principal",
            SchoolField::Location => "location",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SchoolField::Name => "Name",
            SchoolField::Principal => "Principal",
            SchoolField::Location => "Location",
        }
    }

    /// 把配置里的字段名列表解析成白名单
    ///
    /// 未知字段、重复字段、空列表都视为配置错误。
    pub fn parse_allow_list<S: AsRef<str>>(names: &[S]) -> AppResult<Vec<SchoolField>> {
        if names.is_empty() {
            return Err(AppError::validation("views.update_fields", "字段列表不能为空"));
        }

        let mut fields = Vec::with_capacity(names.len());
        for name in names {
            let field: SchoolField = name.as_ref().parse()?;
            if fields.contains(&field) {
                return Err(AppError::validation(
                    "views.update_fields",
                    format!("字段重复: {}", field),
                ));
            }
            fields.push(field);
        }
        Ok(fields)
    }
}

impl fmt::Display for SchoolField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(SchoolField::Name),
            "principal" => Ok(SchoolField::Principal),
            "location" => Ok(SchoolField::Location),
            other => Err(AppError::validation(
                "views.update_fields",
                format!("School 没有可编辑的字段 '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lincoln() -> School {
        School {
            id: 1,
            name: "Lincoln High".to_string(),
            principal: "J. Smith".to_string(),
            location: "Springfield".to_string(),
        }
    }

    #[test]
    fn test_parse_allow_list() {
        let fields = SchoolField::parse_allow_list(&["name", "principal"]).unwrap();
        assert_eq!(fields, vec![SchoolField::Name, SchoolField::Principal]);

        assert!(SchoolField::parse_allow_list::<&str>(&[]).is_err());
        assert!(SchoolField::parse_allow_list(&["name", "name"]).is_err());
        assert!(SchoolField::parse_allow_list(&["id"]).is_err());
    }

    #[test]
    fn test_changes_leave_other_fields() {
        let mut school = lincoln();
        let mut changes = SchoolChanges::default();
        assert!(changes.is_empty());

        changes.set(SchoolField::Name, "Lincoln HS".to_string());
        changes.apply_to(&mut school);

        assert_eq!(school.name, "Lincoln HS");
        assert_eq!(school.principal, "J. Smith");
        assert_eq!(school.location, "Springfield");
        assert_eq!(school.id, 1);
    }

    #[test]
    fn test_field_accessor() {
        let school = lincoln();
        let values: Vec<&str> = SchoolField::ALL.iter().map(|f| school.field(*f)).collect();
        assert_eq!(values, vec!["Lincoln High", "J. Smith", "Springfield"]);
    }
}

//! Inner joins
//!
//! A joined query still returns rows of the model's own table only
//! (`SELECT <table>.* ...`), so hydration is unaffected. Joined tables may
//! carry columns with the same names as the model's; predicates should be
//! qualified.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub table: String,
    pub left_field: String,
    pub right_field: String,
}

impl JoinClause {
    /// `INNER JOIN <table> ON <left_field> = <right_field>`
    pub fn inner(
        table: impl Into<String>,
        left_field: impl Into<String>,
        right_field: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            left_field: left_field.into(),
            right_field: right_field.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        format!(
            "INNER JOIN {} ON {} = {}",
            self.table, self.left_field, self.right_field
        )
    }
}

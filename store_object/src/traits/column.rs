/// Mapping between a model attribute and the column that stores it
///
/// The attribute is the serde field name on the model struct. The column name
/// defaults to the attribute and can be overridden per model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub attribute: String,
    pub column_name: String,
    pub is_primary: bool,
}

impl ColumnDefinition {
    pub fn new(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        Self {
            column_name: attribute.clone(),
            attribute,
            is_primary: false,
        }
    }

    /// Declare the primary key column
    pub fn primary(attribute: impl Into<String>) -> Self {
        Self {
            is_primary: true,
            ..Self::new(attribute)
        }
    }

    /// Store the attribute under a different column name
    pub fn with_column_name(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }
}

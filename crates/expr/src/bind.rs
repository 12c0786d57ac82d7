use indexmap::{IndexMap, IndexSet};

/// Records, per table alias, which columns the query actually references.
///
/// Columns are kept in the order they were first bound,
/// and this order drives the column order of table scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindContext {
    bound_columns: IndexMap<Box<str>, IndexSet<Box<str>>>,
}

impl BindContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table alias without binding any of its columns.
    /// A scan of such a table produces rows with no columns.
    pub fn add_table(&mut self, alias: &str) {
        self.bound_columns.entry(alias.into()).or_default();
    }

    /// Record a reference to `alias.column`.
    /// Returns the position of the column among the bound columns of `alias`.
    pub fn bind_column(&mut self, alias: &str, column: &str) -> usize {
        let columns = self.bound_columns.entry(alias.into()).or_default();
        columns.insert_full(column.into()).0
    }

    /// The referenced columns of `alias`, in binding order
    pub fn bound_columns(&self, alias: &str) -> Option<impl Iterator<Item = &str> + '_> {
        self.bound_columns
            .get(alias)
            .map(|columns| columns.iter().map(|column| column.as_ref()))
    }

    /// The position of `alias.column` among the bound columns of `alias`
    pub fn column_index(&self, alias: &str, column: &str) -> Option<usize> {
        self.bound_columns.get(alias)?.get_index_of(column)
    }

    pub fn has_table(&self, alias: &str) -> bool {
        self.bound_columns.contains_key(alias)
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> + '_ {
        self.bound_columns.keys().map(|alias| alias.as_ref())
    }
}

impl<'a, I> FromIterator<(&'a str, I)> for BindContext
where
    I: IntoIterator<Item = &'a str>,
{
    fn from_iter<T: IntoIterator<Item = (&'a str, I)>>(iter: T) -> Self {
        let mut ctx = Self::new();
        for (alias, columns) in iter {
            ctx.add_table(alias);
            for column in columns {
                ctx.bind_column(alias, column);
            }
        }
        ctx
    }
}

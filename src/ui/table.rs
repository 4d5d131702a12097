use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
pub struct ColumnRow {
    #[tabled(rename = "#")]
    pub position: usize,
    #[tabled(rename = "Column")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub sql_type: String,
}

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Table")]
    pub name: String,
    #[tabled(rename = "Columns")]
    pub columns: usize,
}

/// Render live columns, as returned by `Database::table_columns`
pub fn columns_table(columns: &[(String, String)]) -> String {
    if columns.is_empty() {
        return String::new();
    }

    let rows: Vec<ColumnRow> = columns
        .iter()
        .enumerate()
        .map(|(index, (name, sql_type))| ColumnRow {
            position: index + 1,
            name: name.clone(),
            sql_type: sql_type.clone(),
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

pub fn tables_table(tables: &[(String, usize)]) -> String {
    if tables.is_empty() {
        return String::new();
    }

    let rows: Vec<TableRow> = tables
        .iter()
        .map(|(name, columns)| TableRow {
            name: name.clone(),
            columns: *columns,
        })
        .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

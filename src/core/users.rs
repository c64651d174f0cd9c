//! Users table exchanged through CSV import/export.
//!
//! Header: `username,groups,<attribute columns>`. The groups field holds
//! `|`-separated group names; every further column is a metadata attribute.

use std::collections::BTreeMap;

use crate::core::csv::{CsvDocument, write_rows};
use crate::core::error::CsvError;

pub const USERNAME_COLUMN: &str = "username";
pub const GROUPS_COLUMN: &str = "groups";
const GROUP_SEPARATOR: char = '|';

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserRow {
    pub user_name: String,
    pub groups: Vec<String>,
    /// Attribute values by column name; empty cells are omitted.
    pub attributes: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UsersTable {
    pub attribute_columns: Vec<String>,
    pub rows: Vec<UserRow>,
}

impl UsersTable {
    pub fn from_csv(input: &str) -> Result<Self, CsvError> {
        let document = CsvDocument::parse(input)?;
        let mut rows = document.rows.into_iter();
        let header = rows.next().ok_or(CsvError::Empty)?;

        let position = |name: &'static str| {
            header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or(CsvError::MissingColumn(name))
        };
        let user_column = position(USERNAME_COLUMN)?;
        let groups_column = position(GROUPS_COLUMN)?;
        let attribute_columns: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != user_column && *i != groups_column)
            .map(|(i, name)| (i, name.trim().to_string()))
            .collect();

        let mut table = Self {
            attribute_columns: attribute_columns.iter().map(|(_, n)| n.clone()).collect(),
            rows: Vec::new(),
        };
        for (index, fields) in rows.enumerate() {
            if fields.len() > header.len() {
                return Err(CsvError::TooManyFields {
                    row: index + 2,
                    found: fields.len(),
                    expected: header.len(),
                });
            }
            let cell = |i: usize| fields.get(i).map(|s| s.trim()).unwrap_or_default();
            let user_name = cell(user_column).to_string();
            if user_name.is_empty() {
                continue;
            }
            let groups = cell(groups_column)
                .split(GROUP_SEPARATOR)
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect();
            let attributes = attribute_columns
                .iter()
                .filter(|(i, _)| !cell(*i).is_empty())
                .map(|(i, name)| (name.clone(), cell(*i).to_string()))
                .collect();
            table.rows.push(UserRow {
                user_name,
                groups,
                attributes,
            });
        }
        Ok(table)
    }

    pub fn to_csv(&self, delimiter: char) -> String {
        let mut header = vec![USERNAME_COLUMN.to_string(), GROUPS_COLUMN.to_string()];
        header.extend(self.attribute_columns.iter().cloned());

        let mut rows = vec![header];
        for row in &self.rows {
            let mut fields = vec![
                row.user_name.clone(),
                row.groups.join(&GROUP_SEPARATOR.to_string()),
            ];
            fields.extend(
                self.attribute_columns
                    .iter()
                    .map(|column| row.attributes.get(column).cloned().unwrap_or_default()),
            );
            rows.push(fields);
        }
        write_rows(&rows, delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users() {
        let csv = "username;groups;email;team\n\
                   alice;admins|ops;alice@example.com;\"core; infra\"\n\
                   bob;;;\n\
                   ;ghost;;\n";
        let table = UsersTable::from_csv(csv).unwrap();
        assert_eq!(table.attribute_columns, vec!["email", "team"]);
        assert_eq!(table.rows.len(), 2);

        let alice = &table.rows[0];
        assert_eq!(alice.groups, vec!["admins", "ops"]);
        assert_eq!(alice.attributes["team"], "core; infra");

        let bob = &table.rows[1];
        assert!(bob.groups.is_empty());
        assert!(bob.attributes.is_empty());
    }

    #[test]
    fn test_columns_are_located_by_name() {
        let table = UsersTable::from_csv("Groups,UserName\nops,carol\n").unwrap();
        assert_eq!(table.rows[0].user_name, "carol");
        assert_eq!(table.rows[0].groups, vec!["ops"]);
    }

    #[test]
    fn test_missing_columns_and_long_rows() {
        assert_eq!(
            UsersTable::from_csv("name,groups\nx,y\n"),
            Err(CsvError::MissingColumn(USERNAME_COLUMN))
        );
        assert_eq!(
            UsersTable::from_csv("username,groups\nx,y,z\n"),
            Err(CsvError::TooManyFields {
                row: 2,
                found: 3,
                expected: 2
            })
        );
    }

    #[test]
    fn test_export_quotes_delimiter_values() {
        let table = UsersTable {
            attribute_columns: vec!["team".to_string()],
            rows: vec![UserRow {
                user_name: "alice".to_string(),
                groups: vec!["a".to_string(), "b".to_string()],
                attributes: BTreeMap::from([("team".to_string(), "x,y".to_string())]),
            }],
        };
        let csv = table.to_csv(',');
        assert_eq!(csv, "username,groups,team\nalice,a|b,\"x,y\"\n");
        assert_eq!(UsersTable::from_csv(&csv).unwrap(), table);
    }
}

//! Statement builders derived from `PgEntity` metadata.

use crate::entity::PgEntity;

pub(crate) fn select_sql<E: PgEntity>() -> String {
    format!("SELECT {} FROM {}", E::columns().join(", "), E::table())
}

pub(crate) fn find_sql<E: PgEntity>() -> String {
    format!(
        "SELECT {} FROM {} WHERE {} = $1",
        E::columns().join(", "),
        E::table(),
        E::columns()[0]
    )
}

pub(crate) fn insert_sql<E: PgEntity>() -> String {
    let placeholders: Vec<String> = (1..=E::columns().len()).map(|i| format!("${i}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::table(),
        E::columns().join(", "),
        placeholders.join(", ")
    )
}

pub(crate) fn update_sql<E: PgEntity>() -> String {
    let assignments: Vec<String> = E::columns()
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, col)| format!("{col} = ${}", i + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE {} = $1",
        E::table(),
        assignments.join(", "),
        E::columns()[0]
    )
}

pub(crate) fn delete_sql<E: PgEntity>() -> String {
    format!("DELETE FROM {} WHERE {} = $1", E::table(), E::columns()[0])
}

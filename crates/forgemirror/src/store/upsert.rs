//! Column-aware upserts keyed by deterministic primary key.
//!
//! Both ingest paths write through [`merge_upsert`]: the sync path with fully
//! populated models, the webhook path with whatever columns its payload
//! carries. Only columns the caller actually `Set` appear in the UPDATE, so a
//! partial webhook write never clobbers columns it did not mention and no
//! write ever touches local-only state such as viewed files.

use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, EntityTrait, IdenStatic, IntoActiveModel, Iterable,
    PrimaryKeyToColumn,
};

use super::errors::Result;

/// Non-key columns the caller has `Set` on `model`.
fn set_value_columns<A>(model: &A) -> Vec<<A::Entity as EntityTrait>::Column>
where
    A: ActiveModelTrait,
{
    let key_columns: Vec<<A::Entity as EntityTrait>::Column> =
        <A::Entity as EntityTrait>::PrimaryKey::iter()
            .map(PrimaryKeyToColumn::into_column)
            .collect();
    let key_names: Vec<&str> = key_columns.iter().map(IdenStatic::as_str).collect();

    <A::Entity as EntityTrait>::Column::iter()
        .filter(|col| !key_names.contains(&col.as_str()))
        .filter(|col| model.get(*col).is_set())
        .collect()
}

/// Build the ON CONFLICT clause for `model`: conflict on the primary key,
/// update exactly the set columns. Degrades to DO NOTHING when the model
/// carries nothing but its key.
pub(crate) fn merge_on_conflict<A>(model: &A) -> OnConflict
where
    A: ActiveModelTrait,
{
    let key_columns: Vec<<A::Entity as EntityTrait>::Column> =
        <A::Entity as EntityTrait>::PrimaryKey::iter()
            .map(PrimaryKeyToColumn::into_column)
            .collect();
    let update_columns = set_value_columns(model);

    let mut on_conflict = OnConflict::columns(key_columns);
    if update_columns.is_empty() {
        on_conflict.do_nothing();
    } else {
        on_conflict.update_columns(update_columns);
    }
    on_conflict.to_owned()
}

/// Insert `model`, or update the set columns of the existing row with the
/// same primary key.
///
/// # Errors
/// Returns `StoreError::Database` if the statement fails.
pub async fn merge_upsert<C, A>(db: &C, model: A) -> Result<()>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let on_conflict = merge_on_conflict(&model);
    <A::Entity as EntityTrait>::insert(model)
        .on_conflict(on_conflict)
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Insert `model` if no row with its primary key exists; leave an existing
/// row untouched. Returns whether a row was inserted.
///
/// # Errors
/// Returns `StoreError::Database` if the statement fails.
pub async fn insert_if_absent<C, A>(db: &C, model: A) -> Result<bool>
where
    C: ConnectionTrait,
    A: ActiveModelTrait + Send,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    let key_columns: Vec<<A::Entity as EntityTrait>::Column> =
        <A::Entity as EntityTrait>::PrimaryKey::iter()
            .map(PrimaryKeyToColumn::into_column)
            .collect();

    let rows = <A::Entity as EntityTrait>::insert(model)
        .on_conflict(OnConflict::columns(key_columns).do_nothing().to_owned())
        .exec_without_returning(db)
        .await?;
    Ok(rows > 0)
}

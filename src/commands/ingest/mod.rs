mod artifacts;
mod coordinator;
mod db_setup;
mod persist;
mod run;

pub use run::run;

pub(crate) use db_setup::{
    POSTER_TABLES, count_rows, open_store, open_store_read_only, reset_schema,
};

#[cfg(test)]
pub(crate) use db_setup::{enable_foreign_keys, ensure_schema};
#[cfg(test)]
pub(crate) use persist::{PosterDraft, persist_poster};

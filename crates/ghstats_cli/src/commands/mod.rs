pub(crate) mod limits;
pub(crate) mod migrate;
pub(crate) mod shared;
pub(crate) mod stars;
pub(crate) mod stats;
pub(crate) mod sweep;
pub(crate) mod track;

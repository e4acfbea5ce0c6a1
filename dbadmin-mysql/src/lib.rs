mod connector;
mod row;

pub use connector::{MysqlConnector, MysqlSession};
pub use row::row_to_json;

use core::fmt::Debug;
use std::sync::Arc;

use bb8_postgres::{PostgresConnectionManager, bb8};
use compact_str::CompactString;
use tokio::sync::OnceCell;
use tokio_postgres::{
    NoTls, Row,
    types::{IsNull, Kind, ToSql, Type, to_sql_checked},
};

use crate::{
    config::DbConfig,
    listing::{Listing, SearchQuery, StoredListing},
};

pub type ConnectionManager = PostgresConnectionManager<NoTls>;
pub type Pool = bb8::Pool<ConnectionManager>;
pub type DBError = tokio_postgres::Error;
pub type BB8Error = bb8::RunError<DBError>;
pub type DBResult<T> = Result<T, DBError>;

pub const TABLE: &str = "bus_listings";

const SQL_SCHEMA: &str = "create table if not exists bus_listings (id bigserial primary key, source text not null, destination text not null, date date not null, bus_name text not null, departure_time text not null, arrival_time text not null, duration text not null, price numeric(10, 2) not null check (price >= 0))";
const SQL_INSERT: &str = "with tmp_insert(b, d, a, u, p) as (select * from unnest($4::text[], $5::text[], $6::text[], $7::text[], $8::float8[])) insert into bus_listings (source, destination, date, bus_name, departure_time, arrival_time, duration, price) select $1::text, $2::text, $3::date, b, d, a, u, p from tmp_insert";
const SQL_RECENT: &str = "select id, source, destination, date, bus_name, departure_time, arrival_time, duration, price::float8 from bus_listings order by id desc limit $1";
const SQL_TRUNCATE: &str = "truncate table bus_listings restart identity";

fn manager(config: &DbConfig) -> ConnectionManager {
    let mut pg = tokio_postgres::Config::new();
    pg.host(&config.host)
        .port(config.port)
        .user(&config.user)
        .dbname(&config.dbname)
        .connect_timeout(config.connect_timeout());
    if let Some(password) = &config.password {
        pg.password(password);
    }

    PostgresConnectionManager::new(pg, NoTls)
}

fn builder(config: &DbConfig) -> bb8::Builder<ConnectionManager> {
    Pool::builder()
        .max_size(4)
        .connection_timeout(config.connect_timeout())
}

/// Pool that has already opened one connection, so a bad config fails here.
pub async fn connect(config: &DbConfig) -> DBResult<Pool> {
    builder(config).build(manager(config)).await
}

/// Pool that opens connections on first use; never fails up front.
pub fn connect_lazy(config: &DbConfig) -> Pool {
    builder(config).build_unchecked(manager(config))
}

pub async fn ensure_schema(pool: &Pool) -> Result<(), BB8Error> {
    let conn = pool.get().await?;
    conn.batch_execute(SQL_SCHEMA).await?;
    tracing::info!(target: "db", "table {TABLE} ready");
    Ok(())
}

/// Receives the listings of one search together with the query that found them.
pub trait ListingStore {
    /// Writes one row per listing and returns the number of rows written.
    fn store(
        &self,
        query: &SearchQuery,
        listings: &[Listing],
    ) -> impl Future<Output = anyhow::Result<u64>> + Send;
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool,
    /// Set once the table is known to exist.
    schema: Arc<OnceCell<()>>,
}

impl PgStore {
    pub fn new(pool: Pool) -> Self {
        Self {
            pool,
            schema: Arc::new(OnceCell::new()),
        }
    }

    /// Creates the table on the first successful call; a failure is retried
    /// on the next one.
    pub async fn ensure_schema(&self) -> Result<(), BB8Error> {
        self.schema.get_or_try_init(|| ensure_schema(&self.pool)).await?;
        Ok(())
    }

    pub async fn insert(&self, query: &SearchQuery, listings: &[Listing]) -> Result<u64, BB8Error> {
        self.ensure_schema().await?;
        let mut conn = self.pool.get().await?;
        let txn = conn.transaction().await?;
        let stmt = txn.prepare(SQL_INSERT).await?;
        let n_rows = txn
            .execute(
                &stmt,
                &[
                    &query.source,
                    &query.destination,
                    &query.date,
                    &ToSqlIter(listings.iter().map(|x| x.operator.as_str())),
                    &ToSqlIter(listings.iter().map(|x| x.departure_time.as_str())),
                    &ToSqlIter(listings.iter().map(|x| x.arrival_time.as_str())),
                    &ToSqlIter(listings.iter().map(|x| x.duration.as_str())),
                    &ToSqlIter(listings.iter().map(|x| x.price)),
                ],
            )
            .await?;
        txn.commit().await?;

        tracing::info!(target: "db", "\x1b[36minserted {n_rows}/{} listings\x1b[0m", listings.len());
        Ok(n_rows)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<StoredListing>, BB8Error> {
        self.ensure_schema().await?;
        let conn = self.pool.get().await?;
        let stmt = conn.prepare(SQL_RECENT).await?;
        let rows = conn.query(&stmt, &[&limit]).await?;
        Ok(rows.iter().map(stored_listing).collect::<DBResult<_>>()?)
    }

    pub async fn truncate(&self) -> Result<(), BB8Error> {
        self.ensure_schema().await?;
        let conn = self.pool.get().await?;
        conn.batch_execute(SQL_TRUNCATE).await?;
        tracing::warn!(target: "db", "\x1b[31mtable {TABLE} truncated\x1b[0m");
        Ok(())
    }
}

impl ListingStore for PgStore {
    async fn store(&self, query: &SearchQuery, listings: &[Listing]) -> anyhow::Result<u64> {
        Ok(self.insert(query, listings).await?)
    }
}

fn stored_listing(row: &Row) -> DBResult<StoredListing> {
    Ok(StoredListing {
        id: row.try_get(0)?,
        query: SearchQuery {
            source: row.try_get(1)?,
            destination: row.try_get(2)?,
            date: row.try_get(3)?,
        },
        listing: Listing {
            operator: row.try_get(4)?,
            departure_time: CompactString::from(row.try_get::<_, &str>(5)?),
            arrival_time: CompactString::from(row.try_get::<_, &str>(6)?),
            duration: CompactString::from(row.try_get::<_, &str>(7)?),
            price: row.try_get(8)?,
        },
    })
}

/// Binds any exact-size iterator as a Postgres array parameter, for
/// `unnest`-based bulk inserts.
#[derive(Debug)]
#[repr(transparent)]
pub struct ToSqlIter<T>(pub T);

impl<T, U> ToSql for ToSqlIter<T>
where
    T: ExactSizeIterator<Item = U> + Clone + Debug,
    U: ToSql,
{
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        let Kind::Array(member_type) = ty.kind() else {
            return Err(format!("expected array type, got {ty}").into());
        };

        let lower_bound = match *ty {
            Type::OID_VECTOR | Type::INT2_VECTOR => 0,
            _ => 1,
        };

        let dimension = postgres_protocol::types::ArrayDimension {
            len: self.0.len().try_into()?,
            lower_bound,
        };

        postgres_protocol::types::array_to_sql(
            Some(dimension),
            member_type.oid(),
            self.0.clone(),
            |e, w| match e.to_sql(member_type, w)? {
                IsNull::No => Ok(postgres_protocol::IsNull::No),
                IsNull::Yes => Ok(postgres_protocol::IsNull::Yes),
            },
            out,
        )?;
        Ok(IsNull::No)
    }

    #[inline]
    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    #[test]
    fn array_parameter_has_member_type() {
        let prices = [650.0f64, 1250.5];
        let param = ToSqlIter(prices.iter().copied());
        let mut buf = BytesMut::new();
        assert!(matches!(param.to_sql(&Type::FLOAT8_ARRAY, &mut buf), Ok(IsNull::No)));

        let array = postgres_protocol::types::array_from_sql(&buf).unwrap();
        assert_eq!(array.element_type(), Type::FLOAT8.oid());
        assert!(!array.has_nulls());
    }

    fn unreachable() -> DbConfig {
        DbConfig {
            host: "127.0.0.1".to_owned(),
            port: 1,
            user: "postgres".to_owned(),
            password: None,
            dbname: "postgres".to_owned(),
            connect_timeout: 1,
        }
    }

    #[tokio::test]
    async fn lazy_pool_defers_connection_errors_to_use() {
        let store = PgStore::new(connect_lazy(&unreachable()));

        assert!(store.ensure_schema().await.is_err());
        assert!(store.recent(10).await.is_err());
        assert!(!store.schema.initialized());
    }

    #[test]
    fn scalar_type_is_rejected() {
        let param = ToSqlIter(["a"].into_iter());
        let mut buf = BytesMut::new();
        assert!(param.to_sql(&Type::TEXT, &mut buf).is_err());
    }
}

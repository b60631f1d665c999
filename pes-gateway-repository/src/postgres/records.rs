//! Per-kind SQL for reading and writing records.
//!
//! Every function runs on the connection of the caller's transaction. Link
//! tables (themes, event organizations, occurrences, exchange products) are
//! rewritten wholesale on every save.
use chrono::{DateTime, NaiveDate, Utc};
use pes_gateway_shared::types::{
    Calendar, EntityKind, Event, Exchange, ExchangeType, ExchangeWay, Location, Occurrence,
    Organization, Person, Product, Record, Role,
};
use sqlx::PgConnection;

use crate::errors::StoreError;

#[derive(sqlx::FromRow)]
struct RoleRow {
    slug: String,
    uuid: String,
    label: String,
}

#[derive(sqlx::FromRow)]
struct PersonRow {
    uuid: String,
    first_name: String,
    last_name: String,
    pref_email: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OrganizationRow {
    uuid: String,
    title: String,
    description: Option<String>,
    acronym: Option<String>,
    testimony: String,
    annual_revenue: Option<i64>,
    workforce: Option<String>,
    birth: Option<NaiveDate>,
    web: Option<String>,
    legal_status: Option<String>,
    pref_email: Option<String>,
    pref_phone: Option<String>,
}

#[derive(sqlx::FromRow)]
struct CalendarRow {
    uuid: String,
    title: String,
    description: Option<String>,
}

#[derive(sqlx::FromRow)]
struct EventRow {
    uuid: String,
    title: String,
    description: Option<String>,
    calendar: String,
    organization: Option<String>,
    other_organizations: Option<String>,
    source_info: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OccurrenceRow {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    uuid: String,
    title: String,
    description: Option<String>,
    organization: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ExchangeRow {
    uuid: String,
    title: String,
    permanent: bool,
    expiration: Option<NaiveDate>,
    description: Option<String>,
    eway: String,
    etype: String,
    person: Option<String>,
    organization: Option<String>,
    methods: Vec<i64>,
}

#[derive(sqlx::FromRow)]
struct LocationRow {
    uuid: String,
    label: String,
    adr1: Option<String>,
    adr2: Option<String>,
    zipcode: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

pub(crate) async fn find(
    conn: &mut PgConnection,
    kind: EntityKind,
    key: &str,
) -> Result<Option<Record>, StoreError> {
    let record = match kind {
        EntityKind::Role => find_role(conn, key).await?.map(Record::Role),
        EntityKind::Person => find_person(conn, key).await?.map(Record::Person),
        EntityKind::Organization => find_organization(conn, key).await?.map(Record::Organization),
        EntityKind::Calendar => find_calendar(conn, key).await?.map(Record::Calendar),
        EntityKind::Event => find_event(conn, key).await?.map(Record::Event),
        EntityKind::Product => find_product(conn, key).await?.map(Record::Product),
        EntityKind::Exchange => find_exchange(conn, key).await?.map(Record::Exchange),
        EntityKind::Location => find_location(conn, key).await?.map(Record::Location),
    };
    Ok(record)
}

pub(crate) async fn keys(
    conn: &mut PgConnection,
    kind: EntityKind,
) -> Result<Vec<String>, StoreError> {
    let sql = format!(
        "SELECT {key} FROM {table} ORDER BY {key}",
        key = kind.key_field(),
        table = kind.resource()
    );
    let keys = sqlx::query_scalar::<_, String>(&sql)
        .fetch_all(&mut *conn)
        .await?;
    Ok(keys)
}

/// First unmarked record that deleting `key` would cascade to.
pub(crate) async fn native_dependents(
    conn: &mut PgConnection,
    kind: EntityKind,
    key: &str,
) -> Result<Option<(EntityKind, String)>, StoreError> {
    if kind != EntityKind::Calendar {
        return Ok(None);
    }
    let dependent = sqlx::query_scalar::<_, String>(
        "SELECT e.uuid FROM events e \
         LEFT JOIN foreign_events f ON f.local_key = e.uuid \
         WHERE e.calendar = $1 AND f.local_key IS NULL \
         ORDER BY e.uuid LIMIT 1",
    )
    .bind(key)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(dependent.map(|uuid| (EntityKind::Event, uuid)))
}

pub(crate) async fn exists(
    conn: &mut PgConnection,
    kind: EntityKind,
    key: &str,
) -> Result<bool, StoreError> {
    let sql = format!(
        "SELECT EXISTS (SELECT 1 FROM {table} WHERE {key} = $1)",
        key = kind.key_field(),
        table = kind.resource()
    );
    let found = sqlx::query_scalar::<_, bool>(&sql)
        .bind(key)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found)
}

/// Deletes one record; owned rows and the marker go through `ON DELETE CASCADE`.
pub(crate) async fn delete(
    conn: &mut PgConnection,
    kind: EntityKind,
    key: &str,
) -> Result<bool, StoreError> {
    let sql = format!(
        "DELETE FROM {table} WHERE {key} = $1",
        key = kind.key_field(),
        table = kind.resource()
    );
    let result = sqlx::query(&sql).bind(key).execute(&mut *conn).await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn save(conn: &mut PgConnection, record: &Record) -> Result<(), StoreError> {
    match record {
        Record::Role(role) => save_role(conn, role).await,
        Record::Person(person) => save_person(conn, person).await,
        Record::Organization(organization) => save_organization(conn, organization).await,
        Record::Calendar(calendar) => save_calendar(conn, calendar).await,
        Record::Event(event) => save_event(conn, event).await,
        Record::Product(product) => save_product(conn, product).await,
        Record::Exchange(exchange) => save_exchange(conn, exchange).await,
        Record::Location(location) => save_location(conn, location).await,
    }
}

async fn find_role(conn: &mut PgConnection, slug: &str) -> Result<Option<Role>, StoreError> {
    let row = sqlx::query_as::<_, RoleRow>("SELECT slug, uuid, label FROM roles WHERE slug = $1")
        .bind(slug)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(|row| Role {
        uuid: row.uuid,
        slug: row.slug,
        label: row.label,
    }))
}

async fn save_role(conn: &mut PgConnection, role: &Role) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO roles (slug, uuid, label)
        VALUES ($1, $2, $3)
        ON CONFLICT (slug)
        DO UPDATE SET uuid = EXCLUDED.uuid, label = EXCLUDED.label
        "#,
    )
    .bind(&role.slug)
    .bind(&role.uuid)
    .bind(&role.label)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn find_person(conn: &mut PgConnection, uuid: &str) -> Result<Option<Person>, StoreError> {
    let row = sqlx::query_as::<_, PersonRow>(
        "SELECT uuid, first_name, last_name, pref_email FROM persons WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|row| Person {
        uuid: row.uuid,
        first_name: row.first_name,
        last_name: row.last_name,
        pref_email: row.pref_email,
    }))
}

async fn save_person(conn: &mut PgConnection, person: &Person) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO persons (uuid, first_name, last_name, pref_email)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (uuid)
        DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            pref_email = EXCLUDED.pref_email
        "#,
    )
    .bind(&person.uuid)
    .bind(&person.first_name)
    .bind(&person.last_name)
    .bind(&person.pref_email)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn find_organization(
    conn: &mut PgConnection,
    uuid: &str,
) -> Result<Option<Organization>, StoreError> {
    let Some(row) = sqlx::query_as::<_, OrganizationRow>(
        r#"
        SELECT uuid, title, description, acronym, testimony, annual_revenue, workforce,
               birth, web, legal_status, pref_email, pref_phone
        FROM organizations
        WHERE uuid = $1
        "#,
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let transverse_themes = sqlx::query_scalar::<_, i64>(
        "SELECT theme FROM organization_transverse_themes WHERE organization = $1 ORDER BY position",
    )
    .bind(uuid)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Organization {
        uuid: row.uuid,
        title: row.title,
        description: row.description,
        acronym: row.acronym,
        testimony: row.testimony,
        annual_revenue: row.annual_revenue,
        workforce: row.workforce,
        birth: row.birth,
        web: row.web,
        legal_status: row.legal_status,
        pref_email: row.pref_email,
        pref_phone: row.pref_phone,
        transverse_themes,
    }))
}

async fn save_organization(
    conn: &mut PgConnection,
    organization: &Organization,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO organizations (uuid, title, description, acronym, testimony, annual_revenue,
                                   workforce, birth, web, legal_status, pref_email, pref_phone)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (uuid)
        DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            acronym = EXCLUDED.acronym,
            testimony = EXCLUDED.testimony,
            annual_revenue = EXCLUDED.annual_revenue,
            workforce = EXCLUDED.workforce,
            birth = EXCLUDED.birth,
            web = EXCLUDED.web,
            legal_status = EXCLUDED.legal_status,
            pref_email = EXCLUDED.pref_email,
            pref_phone = EXCLUDED.pref_phone
        "#,
    )
    .bind(&organization.uuid)
    .bind(&organization.title)
    .bind(&organization.description)
    .bind(&organization.acronym)
    .bind(&organization.testimony)
    .bind(organization.annual_revenue)
    .bind(&organization.workforce)
    .bind(organization.birth)
    .bind(&organization.web)
    .bind(&organization.legal_status)
    .bind(&organization.pref_email)
    .bind(&organization.pref_phone)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM organization_transverse_themes WHERE organization = $1")
        .bind(&organization.uuid)
        .execute(&mut *conn)
        .await?;
    for (position, theme) in organization.transverse_themes.iter().enumerate() {
        sqlx::query(
            "INSERT INTO organization_transverse_themes (organization, theme, position) VALUES ($1, $2, $3)",
        )
        .bind(&organization.uuid)
        .bind(theme)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn find_calendar(
    conn: &mut PgConnection,
    uuid: &str,
) -> Result<Option<Calendar>, StoreError> {
    let row = sqlx::query_as::<_, CalendarRow>(
        "SELECT uuid, title, description FROM calendars WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|row| Calendar {
        uuid: row.uuid,
        title: row.title,
        description: row.description,
    }))
}

async fn save_calendar(conn: &mut PgConnection, calendar: &Calendar) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO calendars (uuid, title, description)
        VALUES ($1, $2, $3)
        ON CONFLICT (uuid)
        DO UPDATE SET title = EXCLUDED.title, description = EXCLUDED.description
        "#,
    )
    .bind(&calendar.uuid)
    .bind(&calendar.title)
    .bind(&calendar.description)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn find_event(conn: &mut PgConnection, uuid: &str) -> Result<Option<Event>, StoreError> {
    let Some(row) = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT uuid, title, description, calendar, organization, other_organizations, source_info
        FROM events
        WHERE uuid = $1
        "#,
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let organizations = sqlx::query_scalar::<_, String>(
        "SELECT organization FROM event_organizations WHERE event = $1 ORDER BY position",
    )
    .bind(uuid)
    .fetch_all(&mut *conn)
    .await?;

    let occurrences = sqlx::query_as::<_, OccurrenceRow>(
        "SELECT start_time, end_time FROM occurrences WHERE event = $1 ORDER BY id",
    )
    .bind(uuid)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|row| Occurrence {
        start_time: row.start_time,
        end_time: row.end_time,
    })
    .collect();

    Ok(Some(Event {
        uuid: row.uuid,
        title: row.title,
        description: row.description,
        calendar: row.calendar,
        organization: row.organization,
        organizations,
        other_organizations: row.other_organizations,
        source_info: row.source_info,
        occurrences,
    }))
}

async fn save_event(conn: &mut PgConnection, event: &Event) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO events (uuid, title, description, calendar, organization,
                            other_organizations, source_info)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (uuid)
        DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            calendar = EXCLUDED.calendar,
            organization = EXCLUDED.organization,
            other_organizations = EXCLUDED.other_organizations,
            source_info = EXCLUDED.source_info
        "#,
    )
    .bind(&event.uuid)
    .bind(&event.title)
    .bind(&event.description)
    .bind(&event.calendar)
    .bind(&event.organization)
    .bind(&event.other_organizations)
    .bind(&event.source_info)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM event_organizations WHERE event = $1")
        .bind(&event.uuid)
        .execute(&mut *conn)
        .await?;
    for (position, organization) in event.organizations.iter().enumerate() {
        sqlx::query(
            "INSERT INTO event_organizations (event, organization, position) VALUES ($1, $2, $3)",
        )
        .bind(&event.uuid)
        .bind(organization)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }

    sqlx::query("DELETE FROM occurrences WHERE event = $1")
        .bind(&event.uuid)
        .execute(&mut *conn)
        .await?;
    for occurrence in &event.occurrences {
        sqlx::query("INSERT INTO occurrences (event, start_time, end_time) VALUES ($1, $2, $3)")
            .bind(&event.uuid)
            .bind(occurrence.start_time)
            .bind(occurrence.end_time)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn find_product(conn: &mut PgConnection, uuid: &str) -> Result<Option<Product>, StoreError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT uuid, title, description, organization FROM products WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|row| Product {
        uuid: row.uuid,
        title: row.title,
        description: row.description,
        organization: row.organization,
    }))
}

async fn save_product(conn: &mut PgConnection, product: &Product) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO products (uuid, title, description, organization)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (uuid)
        DO UPDATE SET
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            organization = EXCLUDED.organization
        "#,
    )
    .bind(&product.uuid)
    .bind(&product.title)
    .bind(&product.description)
    .bind(&product.organization)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn find_exchange(
    conn: &mut PgConnection,
    uuid: &str,
) -> Result<Option<Exchange>, StoreError> {
    let Some(row) = sqlx::query_as::<_, ExchangeRow>(
        r#"
        SELECT uuid, title, permanent, expiration, description, eway, etype,
               person, organization, methods
        FROM exchanges
        WHERE uuid = $1
        "#,
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };

    let products = sqlx::query_scalar::<_, String>(
        "SELECT product FROM exchange_products WHERE exchange = $1 ORDER BY position",
    )
    .bind(uuid)
    .fetch_all(&mut *conn)
    .await?;

    let eway = ExchangeWay::parse(&row.eway)
        .ok_or_else(|| StoreError::InvalidValue(format!("exchange way {}", row.eway)))?;
    let etype = ExchangeType::parse(&row.etype)
        .ok_or_else(|| StoreError::InvalidValue(format!("exchange type {}", row.etype)))?;

    Ok(Some(Exchange {
        uuid: row.uuid,
        title: row.title,
        permanent: row.permanent,
        expiration: row.expiration,
        description: row.description,
        eway,
        etype,
        person: row.person,
        organization: row.organization,
        products,
        methods: row.methods,
    }))
}

async fn save_exchange(conn: &mut PgConnection, exchange: &Exchange) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO exchanges (uuid, title, permanent, expiration, description, eway, etype,
                               person, organization, methods)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (uuid)
        DO UPDATE SET
            title = EXCLUDED.title,
            permanent = EXCLUDED.permanent,
            expiration = EXCLUDED.expiration,
            description = EXCLUDED.description,
            eway = EXCLUDED.eway,
            etype = EXCLUDED.etype,
            person = EXCLUDED.person,
            organization = EXCLUDED.organization,
            methods = EXCLUDED.methods
        "#,
    )
    .bind(&exchange.uuid)
    .bind(&exchange.title)
    .bind(exchange.permanent)
    .bind(exchange.expiration)
    .bind(&exchange.description)
    .bind(exchange.eway.as_str())
    .bind(exchange.etype.as_str())
    .bind(&exchange.person)
    .bind(&exchange.organization)
    .bind(&exchange.methods)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM exchange_products WHERE exchange = $1")
        .bind(&exchange.uuid)
        .execute(&mut *conn)
        .await?;
    for (position, product) in exchange.products.iter().enumerate() {
        sqlx::query(
            "INSERT INTO exchange_products (exchange, product, position) VALUES ($1, $2, $3)",
        )
        .bind(&exchange.uuid)
        .bind(product)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn find_location(
    conn: &mut PgConnection,
    uuid: &str,
) -> Result<Option<Location>, StoreError> {
    let row = sqlx::query_as::<_, LocationRow>(
        "SELECT uuid, label, adr1, adr2, zipcode, city, country FROM locations WHERE uuid = $1",
    )
    .bind(uuid)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(row.map(|row| Location {
        uuid: row.uuid,
        label: row.label,
        adr1: row.adr1,
        adr2: row.adr2,
        zipcode: row.zipcode,
        city: row.city,
        country: row.country,
    }))
}

async fn save_location(conn: &mut PgConnection, location: &Location) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO locations (uuid, label, adr1, adr2, zipcode, city, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (uuid)
        DO UPDATE SET
            label = EXCLUDED.label,
            adr1 = EXCLUDED.adr1,
            adr2 = EXCLUDED.adr2,
            zipcode = EXCLUDED.zipcode,
            city = EXCLUDED.city,
            country = EXCLUDED.country
        "#,
    )
    .bind(&location.uuid)
    .bind(&location.label)
    .bind(&location.adr1)
    .bind(&location.adr2)
    .bind(&location.zipcode)
    .bind(&location.city)
    .bind(&location.country)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

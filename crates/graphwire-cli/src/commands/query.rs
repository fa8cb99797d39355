use futures::TryStreamExt;
use graphwire::{Connection, Options, SessionType, TransactionType};
use tracing::debug;

const AGGREGATES: [&str; 7] = ["count", "sum", "max", "min", "mean", "median", "std"];

/// What a query does, judged from its keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Define,
    Undefine,
    Match,
    Aggregate,
    Insert,
    Delete,
    Update,
}

fn classify(query: &str) -> QueryKind {
    let tokens: Vec<String> = query
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    let has = |keyword: &str| tokens.iter().any(|t| t == keyword);

    match tokens.first().map(String::as_str) {
        Some("define") => return QueryKind::Define,
        Some("undefine") => return QueryKind::Undefine,
        _ => {}
    }
    match (has("insert"), has("delete")) {
        (true, true) => return QueryKind::Update,
        (true, false) => return QueryKind::Insert,
        (false, true) => return QueryKind::Delete,
        (false, false) => {}
    }
    let tail: Vec<&str> = tokens.iter().rev().take(2).map(String::as_str).collect();
    let is_aggregate = match tail.as_slice() {
        [last, ..] if AGGREGATES.contains(last) => true,
        [last, before] if last.starts_with('$') => AGGREGATES.contains(before),
        _ => false,
    };
    if is_aggregate {
        QueryKind::Aggregate
    } else {
        QueryKind::Match
    }
}

pub struct QueryRequest<'a> {
    pub database: &'a str,
    pub query: &'a str,
    pub schema: bool,
    pub write: bool,
    pub options: Options,
}

pub async fn run(connection: &Connection, request: QueryRequest<'_>) -> anyhow::Result<()> {
    let kind = classify(request.query);
    debug!(?kind, database = request.database, "running query");

    let session_type = if request.schema {
        SessionType::Schema
    } else {
        SessionType::Data
    };
    let transaction_type = if request.write {
        TransactionType::Write
    } else {
        TransactionType::Read
    };
    let session = connection
        .session(request.database, session_type, request.options.clone())
        .await?;
    let tx = session.transaction(transaction_type, request.options).await?;
    let queries = tx.query();

    match kind {
        QueryKind::Define => queries.define(request.query).await?,
        QueryKind::Undefine => queries.undefine(request.query).await?,
        QueryKind::Delete => queries.delete(request.query).await?,
        QueryKind::Aggregate => {
            println!("{}", queries.match_aggregate(request.query).await?);
        }
        QueryKind::Match | QueryKind::Insert | QueryKind::Update => {
            let mut answers = match kind {
                QueryKind::Insert => queries.insert(request.query)?,
                QueryKind::Update => queries.update(request.query)?,
                _ => queries.match_(request.query)?,
            };
            let mut count = 0usize;
            while let Some(answer) = answers.try_next().await? {
                println!("{answer}");
                count += 1;
            }
            eprintln!("{count} answers");
        }
    }

    if request.write {
        tx.commit().await?;
        eprintln!("✓ Committed");
    } else {
        tx.close();
    }
    session.close().await;
    Ok(())
}

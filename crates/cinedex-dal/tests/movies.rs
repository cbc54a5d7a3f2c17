use std::time::Duration;

use cinedex_dal::{
    Error, Filters, Metadata, Order, Pool,
    movie::{CreateMovie, Movie, MovieRepository},
    runtime::Runtime,
};
use tracing_test::traced_test;

fn genres(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

async fn init_db() -> Pool {
    cinedex_dal::new_pool("sqlite::memory:").await.unwrap()
}

async fn insert(repo: &MovieRepository, title: &str, year: i32, names: &[&str]) -> Movie {
    let mut movie = Movie::new(title, year, 100, genres(names));
    repo.insert(&mut movie).await.unwrap();
    movie
}

#[tokio::test]
#[traced_test]
async fn test_insert_and_get() {
    let repo = MovieRepository::new(init_db().await);

    let mut movie = Movie::new("Casablanca", 1942, 102, genres(&["drama", "romance"]));
    let id = repo.insert(&mut movie).await.unwrap();
    assert!(id > 0);
    assert_eq!(movie.id, id);
    assert_eq!(movie.version, 1);
    assert!(movie.created_at.is_some());

    let stored = repo.get(id).await.unwrap();
    assert_eq!(stored.title, "Casablanca");
    assert_eq!(stored.year, 1942);
    assert_eq!(stored.runtime, Runtime::new(102));
    assert_eq!(stored.genres, genres(&["drama", "romance"]));
    assert_eq!(stored.version, 1);
    assert!(stored.created_at.is_some());
    assert_eq!(stored, movie);
}

#[tokio::test]
async fn test_create_validates() {
    let repo = MovieRepository::new(init_db().await);

    let created = repo
        .create(CreateMovie {
            title: "Moana".to_string(),
            year: 2016,
            runtime: Runtime::new(107),
            genres: genres(&["animation", "adventure"]),
        })
        .await
        .unwrap();
    assert_eq!(created.version, 1);
    assert_eq!(repo.get(created.id).await.unwrap().title, "Moana");

    let res = repo
        .create(CreateMovie {
            title: "Moana".to_string(),
            ..Default::default()
        })
        .await;
    assert!(matches!(res, Err(Error::Validation(_))));
}

#[tokio::test]
async fn test_get_missing() {
    let repo = MovieRepository::new(init_db().await);
    let movie = insert(&repo, "Alien", 1979, &["sci-fi"]).await;

    let res = repo.get(movie.id + 1000).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));
    let res = repo.get(0).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));
}

#[tokio::test]
#[traced_test]
async fn test_update() {
    let repo = MovieRepository::new(init_db().await);
    let mut movie = insert(&repo, "Alien", 1979, &["sci-fi"]).await;

    movie.title = "Aliens".to_string();
    movie.year = 1986;
    movie.genres = genres(&["sci-fi", "action"]);
    repo.update(&mut movie).await.unwrap();
    assert_eq!(movie.version, 2);

    let stored = repo.get(movie.id).await.unwrap();
    assert_eq!(stored.title, "Aliens");
    assert_eq!(stored.year, 1986);
    assert_eq!(stored.genres, genres(&["sci-fi", "action"]));
    assert_eq!(stored.version, 2);
}

#[tokio::test]
#[traced_test]
async fn test_update_stale_version() {
    let repo = MovieRepository::new(init_db().await);
    let movie = insert(&repo, "Alien", 1979, &["sci-fi"]).await;

    let mut first = repo.get(movie.id).await.unwrap();
    let mut second = repo.get(movie.id).await.unwrap();

    first.runtime = Runtime::new(117);
    repo.update(&mut first).await.unwrap();

    second.title = "Alien 3".to_string();
    let res = repo.update(&mut second).await;
    assert!(matches!(res, Err(Error::EditConflict { version: 1, .. })));
    assert_eq!(second.version, 1);

    let stored = repo.get(movie.id).await.unwrap();
    assert_eq!(stored.title, "Alien");
    assert_eq!(stored.runtime, Runtime::new(117));
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_update_missing_is_conflict() {
    let repo = MovieRepository::new(init_db().await);
    let mut movie = Movie::new("Ghost", 1990, 127, genres(&["romance"]));
    movie.id = 42;
    movie.version = 1;
    let res = repo.update(&mut movie).await;
    assert!(matches!(res, Err(Error::EditConflict { id: 42, .. })));
}

#[tokio::test]
async fn test_delete() {
    let repo = MovieRepository::new(init_db().await);
    let movie = insert(&repo, "Alien", 1979, &["sci-fi"]).await;

    assert!(matches!(repo.delete(0).await, Err(Error::RecordNotFound(_))));
    assert!(matches!(repo.delete(-3).await, Err(Error::RecordNotFound(_))));

    repo.delete(movie.id).await.unwrap();
    assert!(matches!(
        repo.get(movie.id).await,
        Err(Error::RecordNotFound(_))
    ));
    assert!(matches!(
        repo.delete(movie.id).await,
        Err(Error::RecordNotFound(_))
    ));
}

#[tokio::test]
#[traced_test]
async fn test_paging() {
    let repo = MovieRepository::new(init_db().await);
    for i in 0..12 {
        insert(&repo, &format!("Movie {i}"), 1990 + i, &["drama"]).await;
    }

    let page = repo
        .get_all("", &[], &Filters::new(1, 5, Order::default()))
        .await
        .unwrap();
    assert_eq!(page.movies.len(), 5);
    assert_eq!(
        page.metadata,
        Metadata {
            current_page: 1,
            page_size: 5,
            first_page: 1,
            last_page: 3,
            total_records: 12,
        }
    );

    let last = repo
        .get_all("", &[], &Filters::new(3, 5, Order::default()))
        .await
        .unwrap();
    assert_eq!(last.movies.len(), 2);
    assert_eq!(last.metadata.current_page, 3);
    assert_eq!(last.metadata.total_records, 12);
    assert_eq!(last.movies[1].title, "Movie 11");
}

#[tokio::test]
async fn test_empty_listing() {
    let repo = MovieRepository::new(init_db().await);
    let page = repo
        .get_all("", &[], &Filters::new(1, 5, Order::default()))
        .await
        .unwrap();
    assert!(page.movies.is_empty());
    assert_eq!(page.metadata, Metadata::default());

    insert(&repo, "Alien", 1979, &["sci-fi"]).await;
    let page = repo
        .get_all("nothing", &[], &Filters::default())
        .await
        .unwrap();
    assert!(page.movies.is_empty());
    assert_eq!(page.metadata, Metadata::default());
}

#[tokio::test]
async fn test_sort_with_ties() {
    let repo = MovieRepository::new(init_db().await);
    for (title, year) in [("A", 2000), ("B", 1999), ("C", 2000), ("D", 1999), ("E", 2001)] {
        insert(&repo, title, year, &["drama"]).await;
    }

    let page = repo
        .get_all("", &[], &Filters::new(1, 10, "-year".parse().unwrap()))
        .await
        .unwrap();
    let order = page
        .movies
        .iter()
        .map(|m| m.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["E", "A", "C", "B", "D"]);
    for pair in page.movies.windows(2) {
        assert!(pair[0].year >= pair[1].year);
        if pair[0].year == pair[1].year {
            assert!(pair[0].id < pair[1].id);
        }
    }

    let page = repo
        .get_all("", &[], &Filters::new(1, 10, "year".parse().unwrap()))
        .await
        .unwrap();
    let order = page
        .movies
        .iter()
        .map(|m| m.title.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["B", "D", "A", "C", "E"]);
}

#[tokio::test]
async fn test_invalid_filters() {
    let repo = MovieRepository::new(init_db().await);
    let res = repo
        .get_all("", &[], &Filters::new(1, 10, "created_at".parse().unwrap()))
        .await;
    assert!(matches!(res, Err(Error::InvalidOrderByField(f)) if f == "created_at"));

    let res = repo
        .get_all("", &[], &Filters::new(0, 10, Order::default()))
        .await;
    assert!(matches!(res, Err(Error::Validation(_))));
}

async fn ids(repo: &MovieRepository, title: &str, names: &[&str]) -> Vec<i64> {
    repo.get_all(title, &genres(names), &Filters::default())
        .await
        .unwrap()
        .movies
        .into_iter()
        .map(|m| m.id)
        .collect()
}

#[tokio::test]
#[traced_test]
async fn test_title_and_genre_search() {
    let repo = MovieRepository::new(init_db().await);
    let panther = insert(&repo, "Black Panther", 2018, &["action", "adventure"]).await;
    let cat = insert(&repo, "The Black Cat", 1934, &["horror"]).await;
    let island = insert(&repo, "Panther Island", 2001, &["adventure", "drama"]).await;

    assert_eq!(ids(&repo, "black", &[]).await, vec![panther.id, cat.id]);
    assert_eq!(ids(&repo, "PANTHER", &[]).await, vec![panther.id, island.id]);
    assert_eq!(ids(&repo, "black panther", &[]).await, vec![panther.id]);
    assert_eq!(ids(&repo, "", &["adventure"]).await, vec![panther.id, island.id]);
    assert_eq!(ids(&repo, "", &["drama", "adventure"]).await, vec![island.id]);
    assert_eq!(ids(&repo, "", &["horror", "drama"]).await, Vec::<i64>::new());
    assert_eq!(ids(&repo, "panther", &["drama"]).await, vec![island.id]);
    assert_eq!(ids(&repo, "  ", &[]).await.len(), 3);
}

#[tokio::test]
async fn test_search_follows_title_update() {
    let repo = MovieRepository::new(init_db().await);
    let mut movie = insert(&repo, "Alien", 1979, &["sci-fi"]).await;
    movie.title = "Aliens".to_string();
    repo.update(&mut movie).await.unwrap();

    let found = repo.get_all("aliens", &[], &Filters::default()).await.unwrap();
    assert_eq!(found.movies.len(), 1);
    let found = repo.get_all("alien", &[], &Filters::default()).await.unwrap();
    assert!(found.movies.is_empty());
}

#[tokio::test]
async fn test_genres_storage() {
    let pool = init_db().await;
    let repo = MovieRepository::new(pool.clone());

    let movie = insert(&repo, "Untagged", 2000, &[]).await;
    let stored_genres: Option<String> =
        sqlx::query_scalar("SELECT genres FROM movies WHERE id = ?")
            .bind(movie.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(stored_genres, None);
    assert!(repo.get(movie.id).await.unwrap().genres.is_empty());

    let tagged = insert(&repo, "Tagged", 2000, &["drama", "noir"]).await;
    sqlx::query("UPDATE movies SET genres = CAST(genres AS BLOB) WHERE id = ?")
        .bind(tagged.id)
        .execute(&pool)
        .await
        .unwrap();
    assert_eq!(
        repo.get(tagged.id).await.unwrap().genres,
        genres(&["drama", "noir"])
    );
}

#[tokio::test]
async fn test_malformed_genres() {
    let pool = init_db().await;
    let repo = MovieRepository::new(pool.clone());
    let movie = insert(&repo, "Broken", 2000, &["drama"]).await;

    sqlx::query("UPDATE movies SET genres = 'drama,noir' WHERE id = ?")
        .bind(movie.id)
        .execute(&pool)
        .await
        .unwrap();

    let res = repo.get(movie.id).await;
    assert!(matches!(res, Err(Error::GenreDecode(_))));
}

#[tokio::test]
async fn test_constraint_violation() {
    let repo = MovieRepository::new(init_db().await);

    let mut movie = Movie::new("Too old", 1700, 90, genres(&["drama"]));
    let res = repo.insert(&mut movie).await;
    assert!(matches!(res, Err(Error::ConstraintViolation(_))));
    assert_eq!(movie.id, 0);

    let mut movie = insert(&repo, "Fine", 2000, &["drama"]).await;
    movie.runtime = Runtime::new(0);
    let res = repo.update(&mut movie).await;
    assert!(matches!(res, Err(Error::ConstraintViolation(_))));
    assert_eq!(movie.version, 1);
}

#[tokio::test]
#[traced_test]
async fn test_query_timeout() {
    let pool = init_db().await;
    let repo = MovieRepository::new(pool.clone()).with_query_timeout(Duration::from_millis(100));

    // pool for in memory database has single connection
    let held = pool.acquire().await.unwrap();
    let res = repo.get(1).await;
    assert!(matches!(res, Err(Error::Timeout(_))));
    let res = repo.delete(1).await;
    assert!(matches!(res, Err(Error::Timeout(_))));
    drop(held);

    let res = repo.get(1).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));
}

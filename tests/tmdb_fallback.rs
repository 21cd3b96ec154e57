use movie_browser::locale::LocaleContext;
use movie_browser::media::{ApiError, DiscoverFilters};
use movie_browser::tmdb::TmdbClient;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, user_tags: &[&str]) -> TmdbClient {
    let tags = user_tags.iter().map(|t| t.to_string()).collect();
    TmdbClient::new(String::from("test-token"), LocaleContext::new(tags, None))
        .with_base_url(server.uri())
}

fn page(titles: &[(u64, &str)]) -> serde_json::Value {
    json!({
        "page": 1,
        "results": titles
            .iter()
            .map(|(id, title)| json!({"id": id, "title": title, "original_language": "en"}))
            .collect::<Vec<_>>(),
        "total_pages": if titles.is_empty() { 0 } else { 1 },
        "total_results": titles.len(),
    })
}

#[tokio::test]
async fn discover_walks_the_chain_until_results_appear() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("language", "fr-FR"))
        .and(query_param("region", "FR"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/discover/movie"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[(603, "The Matrix")])))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, &["fr-FR"])
        .discover(&DiscoverFilters::default())
        .await
        .unwrap();

    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].title, "The Matrix");
}

#[tokio::test]
async fn credits_try_original_language_in_user_region() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie/603/credits"))
        .and(query_param("language", "fr-FR"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603/credits"))
        .and(query_param("language", "en-FR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 603,
            "cast": [
                {"id": 2, "name": "Carrie-Anne Moss", "character": "Trinity", "order": 2},
                {"id": 1, "name": "Keanu Reeves", "character": "Neo", "order": 0}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/603/credits"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 603, "cast": []})))
        .expect(0)
        .mount(&server)
        .await;

    let cast = client(&server, &["fr-FR"])
        .credits(603, Some("en"))
        .await
        .unwrap();

    let names: Vec<&str> = cast.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Keanu Reeves", "Carrie-Anne Moss"]);
}

#[tokio::test]
async fn last_language_error_is_propagated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("language", "de-DE"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/genre/movie/list"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = client(&server, &["de-DE"]).genres().await;

    assert_eq!(result, Err(ApiError::Unauthorized));
}

#[tokio::test]
async fn empty_last_response_is_returned_not_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search/movie"))
        .and(query_param("query", "zzzz"))
        .and(query_param("year", "2001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(&[])))
        .expect(2)
        .mount(&server)
        .await;

    let result = client(&server, &["es-ES"])
        .search("zzzz", Some(2001), None)
        .await
        .unwrap();

    assert!(result.results.is_empty());
}

#[tokio::test]
async fn details_fall_back_when_overview_is_blank() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/movie/27205"))
        .and(query_param("language", "it-IT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 27205, "title": "Inception", "overview": "", "runtime": 148
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/movie/27205"))
        .and(query_param("language", "en-US"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 27205, "title": "Inception", "overview": "A thief who steals secrets.", "runtime": 148
        })))
        .expect(1)
        .mount(&server)
        .await;

    let details = client(&server, &["it-IT"])
        .details(27205, Some("en"))
        .await
        .unwrap();

    assert_eq!(details.overview, "A thief who steals secrets.");
    assert_eq!(details.runtime, Some(148));
}

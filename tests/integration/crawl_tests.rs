use crate::{read_rows, row_for, test_job};
use rowcrawl::state::{CrawlPhase, StopReason};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn list_mode_fetches_exactly_the_seeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", r#"<a href="/other">Other</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page("B", ""))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(html_page("Other", ""))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job = test_job(
        vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())],
        &output,
    );

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.pages_fetched, 2);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(row_for(&rows, "/a")["title"], "A");
    assert_eq!(row_for(&rows, "/b")["title"], "B");
}

#[tokio::test]
async fn discovery_mode_follows_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/page1">One</a> <a href="/page2">Two</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html_page("Page 1", ""))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page("Page 2", ""))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(vec![format!("{}/", server.uri())], &output);
    job.follow_links = true;

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.pages_fetched, 3);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 3);
    // Depth recorded relative to the seed
    assert_eq!(row_for(&rows, "/page1")["depth"], 1);
    assert_eq!(row_for(&rows, "page2")["depth"], 1);
}

#[tokio::test]
async fn no_url_is_fetched_twice() {
    let server = MockServer::start().await;

    // The seed links to a page that links straight back to the seed
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page("Home", r#"<a href="/loop">Loop</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(html_page("Loop", r#"<a href="/">Back home</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(vec![format!("{}/", server.uri())], &output);
    job.follow_links = true;

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(read_rows(&output).len(), 2);
}

#[tokio::test]
async fn invalid_jsonld_block_does_not_poison_the_row() {
    let server = MockServer::start().await;

    let body = r#"<html><head>
        <title>Article</title>
        <script type="application/ld+json">{"@type": "Article", "headline": "Good block"}</script>
        <script type="application/ld+json">{"@type": broken}</script>
        </head><body><h1>Article</h1><p>Text.</p></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job = test_job(vec![format!("{}/article", server.uri())], &output);

    rowcrawl::crawl(job).await.unwrap();

    let rows = read_rows(&output);
    let row = row_for(&rows, "/article");
    // The valid block is extracted
    assert_eq!(row["jsonld_@type"], "Article");
    assert_eq!(row["jsonld_headline"], "Good block");
    // The broken block is reported in-row
    assert!(row["jsonld_errors"].as_str().unwrap().len() > 0);
    // Everything else is still populated
    assert_eq!(row["title"], "Article");
    assert_eq!(row["h1"], "Article");
    assert_eq!(row["status"], 200);
}

#[tokio::test]
async fn excluded_url_params_are_not_followed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            "Home",
            r#"<a href="/page?utm_source=x">Tracked</a> <a href="/page2?other=1">Plain</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html_page("Tracked", ""))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html_page("Plain", ""))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(vec![format!("{}/", server.uri())], &output);
    job.follow_links = true;
    job.exclude_url_params = Some(rowcrawl::config::ParamFilter::Keys(vec![
        "utm_source".to_string(),
    ]));

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.pages_fetched, 2);
}

#[tokio::test]
async fn pagecount_limit_stops_the_crawl() {
    let server = MockServer::start().await;

    // A linear chain of 10 pages
    for i in 0..10 {
        let body = if i < 9 {
            format!(r#"<a href="/p{}">Next</a>"#, i + 1)
        } else {
            String::new()
        };
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(html_page(&format!("Page {}", i), &body))
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(vec![format!("{}/p0", server.uri())], &output);
    job.follow_links = true;
    job.custom_settings.concurrent_requests = Some(1);
    job.custom_settings.closespider_pagecount = Some(3);

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.phase, CrawlPhase::StoppedByLimit);
    assert_eq!(report.stop_reason, Some(StopReason::PageCount));
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(read_rows(&output).len(), 3);
}

#[tokio::test]
async fn fetch_failure_yields_an_error_row_and_crawl_continues() {
    // Reserve a port with no listener behind it
    let unreachable = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        format!("http://127.0.0.1:{}/dead", port)
    };

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alive"))
        .respond_with(html_page("Alive", ""))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job = test_job(
        vec![unreachable.clone(), format!("{}/alive", server.uri())],
        &output,
    );

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.errors, 1);
    assert_eq!(report.pages_fetched, 1);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    let dead_row = row_for(&rows, "/dead");
    assert!(dead_row["errors"].as_str().unwrap().len() > 0);
    assert!(dead_row.get("status").is_none());
    assert_eq!(row_for(&rows, "/alive")["status"], 200);
}

#[tokio::test]
async fn http_error_statuses_still_produce_full_rows() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string("<html><head><title>Not Found</title></head><body></body></html>")
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job = test_job(vec![format!("{}/missing", server.uri())], &output);

    let report = rowcrawl::crawl(job).await.unwrap();
    // An HTTP error is a response, not a fetch failure
    assert_eq!(report.errors, 0);

    let rows = read_rows(&output);
    assert_eq!(rows[0]["status"], 404);
    assert_eq!(rows[0]["title"], "Not Found");
}

#[tokio::test]
async fn custom_selectors_become_columns() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/product"))
        .respond_with(html_page(
            "Product",
            r#"<span class="price">9.99</span>
               <a class="vendor" href="/vendors/acme">Acme</a>"#,
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(vec![format!("{}/product", server.uri())], &output);
    job.css_selectors
        .insert("price".to_string(), ".price::text".to_string());
    job.xpath_selectors.insert(
        "vendor_url".to_string(),
        r#"//a[@class="vendor"]/@href"#.to_string(),
    );

    rowcrawl::crawl(job).await.unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows[0]["price"], "9.99");
    assert_eq!(rows[0]["vendor_url"], "/vendors/acme");
}

#[tokio::test]
async fn redirects_are_followed_and_recorded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301)
                .insert_header("Location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html_page("Moved", ""))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job = test_job(vec![format!("{}/old", server.uri())], &output);

    rowcrawl::crawl(job).await.unwrap();

    let rows = read_rows(&output);
    let row = &rows[0];
    assert!(row["url"].as_str().unwrap().ends_with("/new"));
    assert_eq!(row["status"], 200);
    assert_eq!(row["redirect_times"], 1);
    assert!(row["redirect_urls"].as_str().unwrap().ends_with("/old"));
    assert_eq!(row["redirect_reasons"], "301");
}

#[tokio::test]
async fn robots_txt_blocks_when_obeyed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/public"))
        .respond_with(html_page("Public", ""))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(html_page("Private", ""))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(
        vec![
            format!("{}/public", server.uri()),
            format!("{}/private", server.uri()),
        ],
        &output,
    );
    job.custom_settings.robotstxt_obey = Some(true);

    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.robots_blocked, 1);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 2);
    assert_eq!(row_for(&rows, "/private")["blocked_by_robotstxt"], true);
    assert_eq!(row_for(&rows, "/public")["title"], "Public");
}

#[tokio::test]
async fn meta_fields_appear_on_every_row() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page("A", ""))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let mut job = test_job(vec![format!("{}/a", server.uri())], &output);
    job.meta.insert(
        "purpose".to_string(),
        serde_json::Value::from("pre-launch test"),
    );

    rowcrawl::crawl(job).await.unwrap();

    let rows = read_rows(&output);
    assert_eq!(rows[0]["purpose"], "pre-launch test");
}

#[tokio::test]
async fn structured_data_blocks_are_numbered() {
    let server = MockServer::start().await;

    let body = r#"<html><head>
        <meta property="og:title" content="Title">
        <meta property="og:image" content="/1.png">
        <meta property="og:image" content="/2.png">
        <meta name="twitter:card" content="summary">
        </head><body></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/og"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job = test_job(vec![format!("{}/og", server.uri())], &output);

    rowcrawl::crawl(job).await.unwrap();

    let rows = read_rows(&output);
    let row = &rows[0];
    assert_eq!(row["og:title"], "Title");
    assert_eq!(row["og:image"], "/1.png");
    assert_eq!(row["og:image_1"], "/2.png");
    assert_eq!(row["twitter:card"], "summary");
}

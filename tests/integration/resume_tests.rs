use crate::{read_rows, test_job};
use rowcrawl::state::CrawlPhase;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(title: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body></body></html>",
            title
        ))
        .insert_header("content-type", "text/html")
}

#[tokio::test]
async fn resume_skips_previously_visited_urls() {
    let server = MockServer::start().await;

    // Five pages, each may be fetched at most once across both runs
    for i in 0..5 {
        Mock::given(method("GET"))
            .and(path(format!("/page{}", i)))
            .respond_with(page(&format!("Page {}", i)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job_dir = dir.path().join("job");

    let seeds: Vec<String> = (0..5).map(|i| format!("{}/page{}", server.uri(), i)).collect();

    // First run visits all five
    let mut job = test_job(seeds.clone(), &output);
    job.job_dir = Some(job_dir.clone());
    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.pages_fetched, 5);

    // Second run with the same seeds fetches nothing new
    let mut job = test_job(seeds, &output);
    job.job_dir = Some(job_dir);
    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.phase, CrawlPhase::Completed);
    assert_eq!(report.pages_fetched, 0);

    assert_eq!(read_rows(&output).len(), 5);
}

#[tokio::test]
async fn resume_fetches_only_the_remainder() {
    let server = MockServer::start().await;

    for name in ["a", "b", "c"] {
        Mock::given(method("GET"))
            .and(path(format!("/{}", name)))
            .respond_with(page(name))
            .expect(1)
            .mount(&server)
            .await;
    }

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("out.jl");
    let job_dir = dir.path().join("job");

    // First run covers /a only
    let mut job = test_job(vec![format!("{}/a", server.uri())], &output);
    job.job_dir = Some(job_dir.clone());
    rowcrawl::crawl(job).await.unwrap();

    // Second run adds /b and /c alongside the already-visited /a
    let mut job = test_job(
        vec![
            format!("{}/a", server.uri()),
            format!("{}/b", server.uri()),
            format!("{}/c", server.uri()),
        ],
        &output,
    );
    job.job_dir = Some(job_dir);
    let report = rowcrawl::crawl(job).await.unwrap();
    assert_eq!(report.pages_fetched, 2);

    let rows = read_rows(&output);
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn fresh_job_dirs_are_independent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(page("X"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();

    for run in 0..2 {
        let output = dir.path().join(format!("out{}.jl", run));
        let mut job = test_job(vec![format!("{}/x", server.uri())], &output);
        job.job_dir = Some(dir.path().join(format!("job{}", run)));
        let report = rowcrawl::crawl(job).await.unwrap();
        assert_eq!(report.pages_fetched, 1);
    }
}

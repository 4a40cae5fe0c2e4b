mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use common::{polling, MockApi, STORED_URL};
use rfp_summarizer::api::SummaryStatus;
use rfp_summarizer::error::ClientError;
use rfp_summarizer::models::DocumentHandle;
use rfp_summarizer::poller::{SummaryPoller, UNEXPECTED_FORMAT};

fn ready(text: &str) -> Result<SummaryStatus, ClientError> {
    Ok(SummaryStatus::Ready(text.to_string()))
}

fn uploaded_handle() -> DocumentHandle {
    DocumentHandle::uploaded(
        "Tender.pdf",
        "https://bucket.s3.amazonaws.com/uploads/jane/f00d_Tender.pdf",
        "f00d",
    )
}

#[tokio::test(start_paused = true)]
async fn retries_until_summary_is_ready() {
    let api = Arc::new(MockApi::with_summaries(vec![
        Ok(SummaryStatus::Pending),
        Ok(SummaryStatus::Pending),
        ready("S"),
    ]));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));

    let start = Instant::now();
    let summary = poller
        .fetch_summary(&DocumentHandle::stored(STORED_URL))
        .await
        .unwrap();

    assert_eq!(summary, "S");
    assert_eq!(api.summary_calls(), 3);
    // Two retry intervals, no grace delay for a stored document.
    assert_eq!(start.elapsed(), Duration::from_secs(16));
}

#[tokio::test(start_paused = true)]
async fn grace_delay_applies_once_per_document() {
    let api = Arc::new(MockApi::with_summaries(vec![ready("first"), ready("second")]));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));
    let handle = uploaded_handle();

    let start = Instant::now();
    assert_eq!(poller.fetch_summary(&handle).await.unwrap(), "first");
    assert_eq!(start.elapsed(), Duration::from_secs(60));

    let again = Instant::now();
    assert_eq!(poller.fetch_summary(&handle).await.unwrap(), "second");
    assert_eq!(again.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn grace_delay_is_tracked_per_document() {
    let api = Arc::new(MockApi::with_summaries(vec![ready("a"), ready("b")]));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));
    let other = DocumentHandle::uploaded(
        "Annex.pdf",
        "https://bucket.s3.amazonaws.com/uploads/jane/beef_Annex.pdf",
        "beef",
    );

    poller.fetch_summary(&uploaded_handle()).await.unwrap();
    let start = Instant::now();
    poller.fetch_summary(&other).await.unwrap();
    assert_eq!(start.elapsed(), Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn gives_up_after_max_attempts() {
    let api = Arc::new(MockApi::default());
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 3));

    let err = poller
        .fetch_summary(&DocumentHandle::stored(STORED_URL))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout { attempts: 3 }));
    assert_eq!(api.summary_calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_max_attempts_polls_until_ready() {
    let mut statuses: Vec<_> = (0..120).map(|_| Ok(SummaryStatus::Pending)).collect();
    statuses.push(ready("late"));
    let api = Arc::new(MockApi::with_summaries(statuses));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 0));

    let summary = poller
        .fetch_summary(&DocumentHandle::stored(STORED_URL))
        .await
        .unwrap();
    assert_eq!(summary, "late");
    assert_eq!(api.summary_calls(), 121);
}

#[tokio::test(start_paused = true)]
async fn malformed_response_returns_sentinel_text() {
    let api = Arc::new(MockApi::with_summaries(vec![Ok(SummaryStatus::Malformed)]));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));

    let summary = poller
        .fetch_summary(&DocumentHandle::stored(STORED_URL))
        .await
        .unwrap();
    assert_eq!(summary, UNEXPECTED_FORMAT);
    assert_eq!(api.summary_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn undecodable_response_returns_sentinel_text() {
    let api = Arc::new(MockApi::with_summaries(vec![
        Ok(SummaryStatus::Pending),
        Err(ClientError::MalformedResponse("body is not JSON".to_string())),
    ]));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));

    let summary = poller
        .fetch_summary(&DocumentHandle::stored(STORED_URL))
        .await
        .unwrap();
    assert_eq!(summary, UNEXPECTED_FORMAT);
    assert_eq!(api.summary_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn transport_error_ends_polling() {
    let api = Arc::new(MockApi::with_summaries(vec![
        Ok(SummaryStatus::Pending),
        Err(ClientError::FetchFailed("connection reset".to_string())),
    ]));
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));

    let err = poller
        .fetch_summary(&DocumentHandle::stored(STORED_URL))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::FetchFailed(_)));
    assert_eq!(api.summary_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn unaddressable_document_makes_no_request() {
    let api = Arc::new(MockApi::default());
    let poller = SummaryPoller::new(api.clone(), &polling(60, 8, 75));

    let err = poller
        .fetch_summary(&DocumentHandle::stored("https://host/Tender.pdf"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::MissingIdentifier(_)));
    assert_eq!(api.summary_calls(), 0);
}

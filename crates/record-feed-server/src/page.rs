// crates/record-feed-server/src/page.rs
// ============================================================================
// Module: Poll Page
// Description: HTML shell that polls the record feed from the browser.
// Purpose: Render the `/` document with the configured poll interval.
// Dependencies: none
// ============================================================================

//! ## Overview
//! The page fetches `/api` once on load and then on a fixed interval,
//! replacing the results container with one line per record. The interval
//! handle is kept so polling stops on `pagehide` or via `stopPolling()`.

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Placeholder replaced with the poll interval in milliseconds.
const POLL_INTERVAL_PLACEHOLDER: &str = "{{POLL_INTERVAL_MS}}";

/// Page template.
const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Infinite Loop</title>
</head>
<body>
  <h1>API Results</h1>
  <div id="results"></div>
  <script>
    const POLL_INTERVAL_MS = {{POLL_INTERVAL_MS}};
    const results = document.getElementById('results');
    let pollHandle = null;

    function render(records) {
      results.replaceChildren();
      records.forEach(record => {
        const line = document.createElement('div');
        line.textContent = `ID: ${record.ID}, Name: ${record.Name}, InsertTime: ${record.InsertTime}`;
        results.appendChild(line);
      });
    }

    function fetchApi() {
      fetch('/api')
        .then(response => response.json())
        .then(data => {
          if (!Array.isArray(data)) {
            throw new Error('unexpected payload from /api');
          }
          render(data);
        })
        .catch(error => console.error('Error fetching API:', error));
    }

    function stopPolling() {
      if (pollHandle !== null) {
        clearInterval(pollHandle);
        pollHandle = null;
      }
    }

    window.stopPolling = stopPolling;
    window.addEventListener('pagehide', stopPolling);
    pollHandle = setInterval(fetchApi, POLL_INTERVAL_MS);
    fetchApi();
  </script>
</body>
</html>
"#;

// ============================================================================
// SECTION: Rendering
// ============================================================================

/// Renders the poll page for the given interval.
#[must_use]
pub fn render_page(poll_interval_ms: u64) -> String {
    PAGE_TEMPLATE.replace(POLL_INTERVAL_PLACEHOLDER, &poll_interval_ms.to_string())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

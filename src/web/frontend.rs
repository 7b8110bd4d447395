//! Embedded HTML/CSS/JS page for the web dashboard.
//!
//! Compiled into the binary as a string constant. The page polls
//! `/api/view` and swaps the server-rendered bins fragment in place.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>SmartBin Dashboard</title>
<style>
:root {
  --bg: #0d1117;
  --surface: #161b22;
  --border: #30363d;
  --text: #e6edf3;
  --text-muted: #8b949e;
  --accent: #58a6ff;
  --green: #3fb950;
  --yellow: #d29922;
  --red: #f85149;
  --radius: 8px;
  --font: -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: var(--bg); color: var(--text); font-family: var(--font); font-size: 14px; }
.app { max-width: 1100px; margin: 0 auto; padding: 24px; }
header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 20px; }
header h1 { font-size: 22px; }
.controls { display: flex; gap: 8px; }
.controls input {
  background: var(--surface); border: 1px solid var(--border); border-radius: 6px;
  color: var(--text); padding: 6px 10px; width: 260px;
}
button {
  background: var(--accent); color: #fff; border: none; border-radius: 6px;
  padding: 6px 12px; cursor: pointer;
}
button.secondary { background: var(--surface); border: 1px solid var(--border); color: var(--text); }
.stats-grid { display: grid; grid-template-columns: repeat(4, 1fr); gap: 16px; margin-bottom: 24px; }
.stat-card {
  background: var(--surface); border: 1px solid var(--border); border-radius: var(--radius);
  padding: 18px; text-align: center;
}
.stat-card .value { font-size: 30px; font-weight: 700; color: var(--accent); }
.stat-card .label { font-size: 12px; color: var(--text-muted); text-transform: uppercase; margin-top: 6px; }
.bins-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 16px; }
.bin-card {
  background: var(--surface); border: 1px solid var(--border); border-left-width: 4px;
  border-radius: var(--radius); padding: 16px;
}
.bin-card.low { border-left-color: var(--green); }
.bin-card.medium { border-left-color: var(--yellow); }
.bin-card.full { border-left-color: var(--red); }
.bin-header { display: flex; justify-content: space-between; margin-bottom: 12px; }
.bin-id { font-weight: 600; }
.bin-status { font-size: 12px; font-weight: 700; padding: 2px 8px; border-radius: 10px; }
.bin-status.low { color: var(--green); }
.bin-status.medium { color: var(--yellow); }
.bin-status.full { color: var(--red); }
.fill-bar-container { background: var(--bg); border-radius: 6px; height: 22px; overflow: hidden; margin-bottom: 12px; }
.fill-bar { background: var(--accent); height: 100%; font-size: 12px; line-height: 22px; padding-left: 6px; white-space: nowrap; }
.bin-details p { color: var(--text-muted); font-size: 13px; margin-top: 4px; }
.loading { color: var(--text-muted); padding: 24px; text-align: center; grid-column: 1 / -1; }
.status-message {
  position: fixed; bottom: 20px; right: 20px; padding: 10px 16px; border-radius: 6px;
  opacity: 0; transition: opacity 0.2s; color: #fff;
}
.status-message.show { opacity: 1; }
.status-message.success { background: var(--green); }
.status-message.error { background: var(--red); }
</style>
</head>
<body>
<div class="app">
  <header>
    <h1>SmartBin Dashboard</h1>
    <div class="controls">
      <input id="serverUrl" type="text" placeholder="http://localhost:5000">
      <button onclick="updateServerUrl()">Save</button>
      <button class="secondary" onclick="post('/api/test-connection')">Test</button>
      <button class="secondary" onclick="post('/api/refresh')">Refresh</button>
    </div>
  </header>

  <section class="stats-grid">
    <div class="stat-card"><div class="value" id="totalBins">-</div><div class="label">Total Bins</div></div>
    <div class="stat-card"><div class="value" id="avgFillLevel">-</div><div class="label">Avg Fill Level</div></div>
    <div class="stat-card"><div class="value" id="binsNeedingAttention">-</div><div class="label">Need Attention</div></div>
    <div class="stat-card"><div class="value" id="totalReadings">-</div><div class="label">Total Readings</div></div>
  </section>

  <section class="bins-grid" id="binsGrid"><div class="loading">Loading bins...</div></section>
</div>
<div class="status-message" id="statusMessage"></div>

<script>
let urlFieldTouched = false;
document.getElementById('serverUrl').addEventListener('input', () => { urlFieldTouched = true; });

function showStatus(status) {
  const el = document.getElementById('statusMessage');
  if (!status) { el.classList.remove('show'); return; }
  el.textContent = status.text;
  el.className = `status-message ${status.kind} show`;
}

async function poll() {
  try {
    const resp = await fetch('/api/view');
    const view = await resp.json();
    document.getElementById('totalBins').textContent = view.stats.total_bins;
    document.getElementById('avgFillLevel').textContent = view.stats.average_fill_level;
    document.getElementById('binsNeedingAttention').textContent = view.stats.bins_needing_attention;
    document.getElementById('totalReadings').textContent = view.stats.total_readings;
    document.getElementById('binsGrid').innerHTML = view.bins_html;
    if (!urlFieldTouched) document.getElementById('serverUrl').value = view.server_url;
    showStatus(view.status);
  } catch (e) {
    console.error('dashboard unreachable', e);
  }
}

async function post(path, body) {
  const resp = await fetch(path, {
    method: body === undefined ? 'POST' : 'PUT',
    headers: { 'Content-Type': 'application/json' },
    body: body === undefined ? undefined : JSON.stringify(body),
  });
  const result = await resp.json();
  showStatus(result.status);
  poll();
}

function updateServerUrl() {
  urlFieldTouched = false;
  post('/api/server-url', { url: document.getElementById('serverUrl').value });
}

poll();
setInterval(poll, 1000);
</script>
</body>
</html>
"##;

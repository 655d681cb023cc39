//! UI routes - dashboard and public detail page
//!
//! Plain HTML with inline vanilla JS talking to the `/api` endpoints.

use axum::{
    response::{Html, IntoResponse},
    routing::get,
    Router,
};

use crate::AppState;

/// Build UI routes
pub fn ui_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard_page))
        .route("/details/:identifier", get(details_page))
}

/// Dashboard: upload, list, edit, delete and download QR codes
async fn dashboard_page() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

/// Public detail page a scanned QR code points at
async fn details_page() -> impl IntoResponse {
    Html(DETAILS_HTML)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>qroster - Dashboard</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 1100px; margin: 30px auto; padding: 0 20px; }
        h1 { border-bottom: 2px solid #0066cc; padding-bottom: 8px; }
        table { width: 100%; border-collapse: collapse; margin-top: 16px; }
        th, td { border-bottom: 1px solid #ddd; padding: 6px 8px; text-align: left; font-size: 14px; }
        img.qr { width: 64px; height: 64px; }
        button { padding: 6px 12px; margin: 2px; cursor: pointer; }
        #status { margin: 10px 0; min-height: 1.2em; }
        .error { color: #b00020; }
        dialog label { display: block; margin: 6px 0; }
        dialog input { width: 100%; }
    </style>
</head>
<body>
    <h1>qroster</h1>

    <form id="upload-form">
        <input type="file" name="file" accept=".xlsx,.xls,.xlsb,.ods" required>
        <button type="submit">Upload spreadsheet</button>
    </form>
    <div id="status"></div>

    <div>
        <button id="download-selected">Download selected QR codes</button>
        <button id="download-all">Download all QR codes</button>
    </div>

    <table>
        <thead>
            <tr>
                <th><input type="checkbox" id="select-all"></th>
                <th>QR</th><th>Identifier</th><th>Name</th><th>Designation</th>
                <th>Constituency</th><th>District</th><th>Phone</th><th></th>
            </tr>
        </thead>
        <tbody id="records"></tbody>
    </table>

    <dialog id="edit-dialog">
        <form method="dialog" id="edit-form">
            <label>Name <input name="name"></label>
            <label>Designation <input name="designation"></label>
            <label>Constituency <input name="constituency"></label>
            <label>District <input name="district"></label>
            <label>Phone <input name="phone_number"></label>
            <label>Photo URL <input name="photo_url"></label>
            <button value="save">Save</button>
            <button value="cancel" formnovalidate>Cancel</button>
        </form>
    </dialog>

    <script>
        let records = [];
        let editing = null;
        const statusEl = document.getElementById('status');

        function setStatus(message, isError) {
            statusEl.textContent = message;
            statusEl.className = isError ? 'error' : '';
        }

        async function errorMessage(response) {
            try {
                const body = await response.json();
                return body.error.message;
            } catch (_) {
                return response.statusText;
            }
        }

        function cell(text) {
            const td = document.createElement('td');
            td.textContent = text;
            return td;
        }

        async function loadRecords() {
            const response = await fetch('/api/employees');
            if (!response.ok) {
                setStatus('Failed to fetch records: ' + await errorMessage(response), true);
                return;
            }
            records = await response.json();
            const tbody = document.getElementById('records');
            tbody.replaceChildren();
            for (const record of records) {
                const tr = document.createElement('tr');

                const select = document.createElement('td');
                const box = document.createElement('input');
                box.type = 'checkbox';
                box.className = 'select';
                box.value = record.identifier;
                select.appendChild(box);
                tr.appendChild(select);

                const qr = document.createElement('td');
                if (record.qr_image_path) {
                    const img = document.createElement('img');
                    img.className = 'qr';
                    img.src = record.qr_image_path;
                    img.alt = record.identifier;
                    qr.appendChild(img);
                }
                tr.appendChild(qr);

                for (const key of ['identifier', 'name', 'designation', 'constituency', 'district', 'phone_number']) {
                    tr.appendChild(cell(record[key]));
                }

                const actions = document.createElement('td');
                const edit = document.createElement('button');
                edit.textContent = 'Edit';
                edit.onclick = () => openEdit(record);
                const del = document.createElement('button');
                del.textContent = 'Delete';
                del.onclick = () => deleteRecord(record);
                actions.append(edit, del);
                tr.appendChild(actions);

                tbody.appendChild(tr);
            }
        }

        function openEdit(record) {
            editing = record;
            const form = document.getElementById('edit-form');
            for (const key of ['name', 'designation', 'constituency', 'district', 'phone_number', 'photo_url']) {
                form.elements[key].value = record[key] || '';
            }
            document.getElementById('edit-dialog').showModal();
        }

        document.getElementById('edit-dialog').addEventListener('close', async (event) => {
            if (event.target.returnValue !== 'save' || !editing) return;
            const form = document.getElementById('edit-form');
            const body = Object.fromEntries(new FormData(form).entries());
            const response = await fetch('/api/employees/' + editing.id, {
                method: 'PUT',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify(body),
            });
            editing = null;
            if (!response.ok) {
                setStatus('Failed to update record: ' + await errorMessage(response), true);
            }
            await loadRecords();
        });

        async function deleteRecord(record) {
            if (!confirm('Delete ' + (record.name || record.identifier) + '?')) return;
            const response = await fetch('/api/employees/' + record.id, { method: 'DELETE' });
            if (!response.ok) {
                setStatus('Failed to delete record: ' + await errorMessage(response), true);
            }
            await loadRecords();
        }

        async function download(identifiers, filename) {
            if (identifiers.length === 0) {
                setStatus('Select at least one record', true);
                return;
            }
            const response = await fetch('/api/employees/batch-download?ids=' + encodeURIComponent(identifiers.join(',')));
            if (!response.ok) {
                setStatus('Download failed: ' + await errorMessage(response), true);
                return;
            }
            const url = URL.createObjectURL(await response.blob());
            const link = document.createElement('a');
            link.href = url;
            link.download = filename;
            link.click();
            URL.revokeObjectURL(url);
        }

        document.getElementById('download-selected').onclick = () => {
            const ids = [...document.querySelectorAll('input.select:checked')].map(box => box.value);
            download(ids, 'qr_codes.zip');
        };

        document.getElementById('download-all').onclick = () => {
            download(records.map(record => record.identifier), 'all_qr_codes.zip');
        };

        document.getElementById('select-all').onchange = (event) => {
            document.querySelectorAll('input.select').forEach(box => { box.checked = event.target.checked; });
        };

        document.getElementById('upload-form').addEventListener('submit', async (event) => {
            event.preventDefault();
            setStatus('Uploading...', false);
            const response = await fetch('/api/upload', { method: 'POST', body: new FormData(event.target) });
            if (!response.ok) {
                setStatus('Upload failed: ' + await errorMessage(response), true);
                return;
            }
            const summary = await response.json();
            const failed = summary.failures.map(f => 'row ' + f.row + ': ' + f.cause).join('; ');
            setStatus('Processed ' + summary.processed + ' of ' + summary.total + (failed ? ' (' + failed + ')' : ''), false);
            event.target.reset();
            await loadRecords();
        });

        loadRecords();
    </script>
</body>
</html>
"#;

const DETAILS_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>qroster - Details</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 560px; margin: 40px auto; padding: 0 20px; }
        .card { border: 1px solid #ddd; border-radius: 8px; padding: 20px; text-align: center; }
        .card img.photo { max-width: 180px; border-radius: 50%; }
        dl { text-align: left; }
        dt { font-weight: bold; margin-top: 8px; }
        .error { color: #b00020; }
    </style>
</head>
<body>
    <div class="card" id="card">Loading...</div>
    <script>
        // Google Drive share links are not embeddable; use the thumbnail endpoint
        function photoSource(url) {
            const match = url.match(/\/d\/([^/]+)\//);
            return match ? 'https://drive.google.com/thumbnail?id=' + match[1] : url;
        }

        async function load() {
            const card = document.getElementById('card');
            const identifier = decodeURIComponent(location.pathname.split('/').pop());
            const response = await fetch('/api/employees/unique/' + encodeURIComponent(identifier));
            if (!response.ok) {
                card.className = 'card error';
                card.textContent = response.status === 404 ? 'Record not found' : 'Failed to load record details';
                return;
            }
            const record = await response.json();
            card.replaceChildren();

            if (record.photo_url) {
                const img = document.createElement('img');
                img.className = 'photo';
                img.src = photoSource(record.photo_url);
                img.alt = record.name;
                card.appendChild(img);
            }

            const name = document.createElement('h2');
            name.textContent = record.name;
            card.appendChild(name);

            const list = document.createElement('dl');
            for (const [label, key] of [['Designation', 'designation'], ['Constituency', 'constituency'], ['District', 'district'], ['Phone', 'phone_number'], ['ID', 'identifier']]) {
                if (!record[key]) continue;
                const dt = document.createElement('dt');
                dt.textContent = label;
                const dd = document.createElement('dd');
                dd.textContent = record[key];
                list.append(dt, dd);
            }
            card.appendChild(list);
        }

        load();
    </script>
</body>
</html>
"#;

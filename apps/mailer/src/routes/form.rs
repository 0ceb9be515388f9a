use axum::response::Html;

/// GET /test-form
/// A bare page for sending any template by hand. Field inputs are built
/// from `/api/templates`, submission goes through `/api/send/:template`.
pub async fn test_form_handler() -> Html<&'static str> {
    Html(TEST_FORM)
}

const TEST_FORM: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>SendScript Mailer - Test Form</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 720px; margin: 40px auto; color: #1f2937; }
    label { display: block; margin-top: 12px; font-weight: bold; }
    input, select, textarea { width: 100%; padding: 8px; margin-top: 4px; box-sizing: border-box; }
    textarea { height: 160px; font-family: monospace; }
    button { margin-top: 16px; padding: 10px 20px; background: #2563eb; color: #fff; border: 0; cursor: pointer; }
    #result { margin-top: 16px; white-space: pre-wrap; font-family: monospace; }
  </style>
</head>
<body>
  <h1>SendScript Mailer</h1>
  <form id="send-form">
    <label for="template">Template</label>
    <select id="template"></select>
    <label for="email">Recipient email</label>
    <input id="email" type="email" required>
    <label for="subject">Subject (optional)</label>
    <input id="subject" type="text">
    <div id="fields"></div>
    <label for="data">Data (JSON, merged over the fields above)</label>
    <textarea id="data">{}</textarea>
    <button type="submit">Send</button>
  </form>
  <div id="result"></div>
  <script>
    let templates = [];
    const select = document.getElementById('template');
    const fieldsBox = document.getElementById('fields');

    function renderFields() {
      const spec = templates.find(t => t.name === select.value);
      fieldsBox.innerHTML = '';
      (spec ? spec.fields : []).forEach(f => {
        const label = document.createElement('label');
        label.textContent = f.label + (f.required ? ' *' : '');
        const input = document.createElement('input');
        input.name = f.key;
        input.placeholder = f.default === null ? '' : String(f.default);
        label.appendChild(input);
        fieldsBox.appendChild(label);
      });
    }

    fetch('/api/templates').then(r => r.json()).then(list => {
      templates = list;
      list.forEach(t => {
        const option = document.createElement('option');
        option.value = t.name;
        option.textContent = '[' + t.category + '] ' + t.label;
        select.appendChild(option);
      });
      renderFields();
    });
    select.addEventListener('change', renderFields);

    document.getElementById('send-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const result = document.getElementById('result');
      let data;
      try {
        data = JSON.parse(document.getElementById('data').value || '{}');
      } catch (e) {
        result.textContent = 'Invalid JSON: ' + e.message;
        return;
      }
      fieldsBox.querySelectorAll('input').forEach(input => {
        if (input.value.trim() !== '' && !(input.name in data)) data[input.name] = input.value;
      });
      const response = await fetch('/api/send/' + encodeURIComponent(select.value), {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({
          email: document.getElementById('email').value,
          subject: document.getElementById('subject').value || null,
          data
        })
      });
      result.textContent = response.status + '\n' + JSON.stringify(await response.json(), null, 2);
    });
  </script>
</body>
</html>
"#;

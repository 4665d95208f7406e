//! Server-rendered upload page.

use crate::{
    models::file_record::FileView,
    services::{
        content_store::{IMAGE_EXTENSIONS, extension_of},
        dropzone_service::size_label,
    },
};

const MIB: u64 = 1024 * 1024;

// Uploads go through `fetch` so the page stays put; the plain form post is
// the fallback when scripts are off. Cards built here follow `render_card`
// and only ever assign client text through `textContent`.
const PAGE_TAIL: &str = r#"</div>
<script>
const form = document.getElementById('image-upload');
const input = form.querySelector('input[type=file]');
const statusLine = document.getElementById('upload-status');
const existing = document.getElementById('existing-files');
const maxBytes = Number(form.dataset.maxBytes);
const imageExtensions = form.dataset.imageExtensions.split(',');

function extensionOf(url) {
  const last = url.split('/').pop();
  const dot = last.lastIndexOf('.');
  return dot > 0 ? last.slice(dot + 1).toLowerCase() : '';
}

function renderCard(id, url, name, size) {
  const card = document.createElement('div');
  card.className = 'card';
  card.id = 'image-' + id;
  const ext = extensionOf(url);
  if (imageExtensions.includes(ext)) {
    const img = document.createElement('img');
    img.src = url;
    img.alt = name;
    card.appendChild(img);
  } else {
    const preview = document.createElement('div');
    preview.className = 'pdf-preview';
    const label = document.createElement(ext === 'pdf' ? 'a' : 'small');
    if (ext === 'pdf') {
      label.href = url;
      label.target = '_blank';
    }
    label.textContent = name;
    preview.appendChild(label);
    card.appendChild(preview);
  }
  const sizeSpan = document.createElement('span');
  sizeSpan.className = 'size';
  sizeSpan.textContent = size;
  card.appendChild(sizeSpan);
  const button = document.createElement('button');
  button.className = 'delete-file';
  button.dataset.id = id;
  button.textContent = 'Delete';
  card.appendChild(button);
  return card;
}

async function upload(file) {
  if (file.size > maxBytes) {
    statusLine.textContent = file.name + ' is larger than ' + form.dataset.maxLabel;
    return;
  }
  const body = new FormData();
  body.append('file', file, file.name);
  let result;
  try {
    const response = await fetch('/dropzone/store', { method: 'POST', body: body });
    result = await response.json();
  } catch (err) {
    result = { success: false, error: String(err) };
  }
  if (result.success) {
    existing.appendChild(renderCard(result.id, result.url, file.name, Math.round(file.size / 1024) + ' KB'));
    statusLine.textContent = '';
  } else {
    statusLine.textContent = result.error || 'Upload failed';
  }
}

async function uploadAll(files) {
  for (const file of files) await upload(file);
}

form.addEventListener('submit', async (event) => {
  event.preventDefault();
  await uploadAll(input.files);
  form.reset();
});
form.addEventListener('dragover', (event) => {
  event.preventDefault();
  form.classList.add('dragover');
});
form.addEventListener('dragleave', () => form.classList.remove('dragover'));
form.addEventListener('drop', async (event) => {
  event.preventDefault();
  form.classList.remove('dragover');
  await uploadAll(event.dataTransfer.files);
});

document.addEventListener('click', async (event) => {
  const button = event.target.closest('.delete-file');
  if (!button || !confirm('Are you sure you want to delete this file?')) return;
  const id = button.dataset.id;
  const response = await fetch('/dropzone/' + id, { method: 'DELETE' });
  const body = await response.json();
  if (body.success) document.getElementById('image-' + id).remove();
});
</script>
</body>
</html>
"#;

/// Render the page with one card per live file. `max_upload_bytes` is shown
/// in the hint and checked client-side before anything is sent.
pub fn render_index(files: &[FileView], max_upload_bytes: u64) -> String {
    let mut html = render_head(max_upload_bytes);
    for file in files {
        html.push_str(&render_card(file));
    }
    html.push_str(PAGE_TAIL);
    html
}

fn render_head(max_upload_bytes: u64) -> String {
    let limit = limit_label(max_upload_bytes);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Drag &amp; Drop File Upload</title>
</head>
<body>
<h3>Drag &amp; Drop File Upload</h3>
<form action="/dropzone/store" method="POST" enctype="multipart/form-data" id="image-upload" data-max-bytes="{max_bytes}" data-max-label="{limit}" data-image-extensions="{images}">
<p>Drag &amp; drop your files here or click to select files</p>
<small>Accepted: jpeg, jpg, png, pdf. Max: {limit}</small>
<input type="file" name="file" accept=".jpeg,.jpg,.png,.pdf" multiple>
<button type="submit">Upload</button>
<p id="upload-status"></p>
</form>
<h5>Uploaded Files:</h5>
<div id="existing-files">
"#,
        max_bytes = max_upload_bytes,
        limit = limit,
        images = IMAGE_EXTENSIONS.join(","),
    )
}

/// Whole mebibytes read as `"5 MB"`, anything else as a kilobyte label.
fn limit_label(bytes: u64) -> String {
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{} MB", bytes / MIB)
    } else {
        size_label(bytes)
    }
}

fn render_card(file: &FileView) -> String {
    let url = html_escape(&file.url);
    let name = html_escape(&file.original_name);
    let extension = extension_of(&file.stored_name).unwrap_or_default();

    let preview = if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        format!(r#"<img src="{}" alt="{}">"#, url, name)
    } else if extension == "pdf" {
        format!(
            r#"<div class="pdf-preview"><a href="{}" target="_blank">{}</a></div>"#,
            url, name
        )
    } else {
        format!(r#"<div class="pdf-preview"><small>{}</small></div>"#, name)
    };

    format!(
        concat!(
            r#"<div class="card" id="image-{id}">"#,
            "{preview}",
            r#"<span class="size">{size}</span>"#,
            r#"<button class="delete-file" data-id="{id}">Delete</button>"#,
            "</div>\n"
        ),
        id = file.id,
        preview = preview,
        size = html_escape(&file.size_label),
    )
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

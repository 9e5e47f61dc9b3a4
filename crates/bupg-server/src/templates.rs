//! HTML templates for the storefront and admin panel.
//!
//! Simple inline HTML templates without a template engine. Dynamic chat and
//! admin views are small scripts that poll the JSON API.

use bupg_store::{Category, Product};

use crate::api::STORAGE_STATUS_HEADER;
use crate::blob_store::LOCAL_URL_PREFIX;

/// Storefront polling interval for an open chat.
pub const CHAT_POLL_MS: u32 = 2500;
/// Admin panel polling interval for the chat list.
pub const ADMIN_POLL_MS: u32 = 3000;

const COMMON_STYLES: &str = r#"
    * { box-sizing: border-box; }
    body {
        font-family: Tahoma, "Segoe UI", Arial, sans-serif;
        margin: 0;
        background: #0b1020;
        color: #f1f5f9;
    }
    a { color: inherit; }
    header {
        display: flex;
        flex-wrap: wrap;
        gap: 12px;
        align-items: center;
        justify-content: space-between;
        padding: 16px 24px;
        border-bottom: 1px solid rgba(255,255,255,0.1);
    }
    header nav a { margin-inline-start: 16px; text-decoration: none; opacity: 0.8; }
    main { max-width: 1100px; margin: 32px auto; padding: 0 20px; display: grid; gap: 24px; }
    .card {
        background: rgba(255,255,255,0.05);
        border: 1px solid rgba(255,255,255,0.1);
        border-radius: 20px;
        padding: 24px;
    }
    .grid { display: grid; gap: 16px; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); }
    .product img { width: 100%; aspect-ratio: 16 / 10; object-fit: cover; border-radius: 14px; }
    .price { font-size: 1.3em; font-weight: bold; }
    .muted { opacity: 0.7; font-size: 0.9em; }
    .error { color: #fda4af; font-weight: bold; }
    .btn {
        display: inline-block;
        background: #6366f1;
        color: white;
        border: none;
        border-radius: 12px;
        padding: 10px 18px;
        font-weight: bold;
        cursor: pointer;
        text-decoration: none;
    }
    .btn.secondary { background: rgba(255,255,255,0.12); }
    .btn.danger { background: #e11d48; }
    .btn:disabled { opacity: 0.5; cursor: default; }
    input, textarea, select {
        width: 100%;
        padding: 10px 12px;
        border-radius: 12px;
        border: 1px solid rgba(255,255,255,0.15);
        background: rgba(255,255,255,0.06);
        color: inherit;
        font: inherit;
    }
    label { display: grid; gap: 6px; font-weight: bold; }
    form { display: grid; gap: 14px; }
    .thread { height: 420px; overflow-y: auto; display: grid; gap: 10px; align-content: start; }
    .bubble { max-width: 85%; padding: 10px 14px; border-radius: 16px; }
    .bubble.customer { background: rgba(99,102,241,0.25); }
    .bubble.admin { background: rgba(16,185,129,0.25); justify-self: end; }
    table { width: 100%; border-collapse: collapse; }
    td, th { padding: 8px; border-bottom: 1px solid rgba(255,255,255,0.08); text-align: start; }
    .row { display: flex; gap: 8px; flex-wrap: wrap; align-items: center; }
    .split { display: grid; gap: 16px; grid-template-columns: 320px 1fr; }
    .chat-item { cursor: pointer; padding: 10px; border-radius: 12px; }
    .chat-item.active { background: rgba(99,102,241,0.25); }
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str, script: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} | متجر الألعاب</title>
    <style>{COMMON_STYLES}</style>
</head>
<body>
    <header>
        <a href="/"><strong>متجر الألعاب</strong></a>
        <nav>
            <a href="/pubg">PUBG</a>
            <a href="/free-fire">Free Fire</a>
            <a href="/topup">الشحن</a>
            <a href="/chat/new">تواصل معنا</a>
        </nav>
    </header>
    <main>
{body}
    </main>
    <script>
{script}
    </script>
</body>
</html>"#,
        title = escape(title),
    )
}

struct CategoryCopy {
    heading: &'static str,
    subtitle: &'static str,
}

fn category_copy(category: Category) -> CategoryCopy {
    match category {
        Category::Pubg => CategoryCopy {
            heading: "حسابات PUBG Mobile",
            subtitle: "اختر حسابك المناسب. جميع العروض قابلة للتعديل من لوحة الإدارة.",
        },
        Category::FreeFire => CategoryCopy {
            heading: "حسابات Free Fire",
            subtitle: "حسابات نادرة وعروض مميزة.",
        },
        Category::Topup => CategoryCopy {
            heading: "خدمات الشحن (Top-up)",
            subtitle: "شحن شدات وجواهر وعملات بسرعة.",
        },
    }
}

pub fn home_page() -> String {
    let cards: String = Category::ALL
        .iter()
        .map(|c| {
            let copy = category_copy(*c);
            format!(
                r#"<a class="card" href="/{slug}"><div class="muted">{slug}</div><h2>{heading}</h2><div class="muted">{subtitle}</div></a>"#,
                slug = c.as_str(),
                heading = copy.heading,
                subtitle = copy.subtitle,
            )
        })
        .collect();

    let body = format!(
        r#"<section class="card">
            <div class="muted">متجر حسابات الألعاب • شحن • تسليم سريع</div>
            <h1>متجر الألعاب</h1>
            <p>اختر القسم الذي تريده. ستجد منتجات جاهزة للعرض ويمكن للآدمن إدارتها من لوحة التحكم.</p>
        </section>
        <section class="grid">{cards}</section>"#
    );
    layout("الرئيسية", &body, "")
}

fn product_card(p: &Product) -> String {
    let image = p
        .image
        .clone()
        .unwrap_or_else(|| format!("{LOCAL_URL_PREFIX}/placeholder.svg"));
    format!(
        r#"<article class="card product">
            <img src="{image}" alt="{title}">
            <h3>{title}</h3>
            <div class="muted">{description}</div>
            <div class="row" style="justify-content: space-between; margin-top: 12px;">
                <span class="price">{price} دج</span>
                <a class="btn" href="/chat/new?productId={id}">شراء</a>
            </div>
        </article>"#,
        image = escape(&image),
        title = escape(&p.title),
        description = escape(&p.description),
        price = p.price,
        id = escape(&encode_query_value(&p.id)),
    )
}

/// Percent-encode a query-string value.
fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~') {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Notice shown when the product list could not be read from storage.
const STORAGE_BANNER: &str = r#"<section class="card error" id="storage-error">تعذر الوصول إلى التخزين حالياً. القائمة المعروضة قد تكون ناقصة.</section>"#;

fn storage_banner(degraded: bool) -> &'static str {
    if degraded {
        STORAGE_BANNER
    } else {
        ""
    }
}

pub fn category_page(category: Category, products: &[Product], degraded: bool) -> String {
    let copy = category_copy(category);
    let cards: String = if products.is_empty() {
        r#"<div class="muted">لا توجد منتجات في هذا القسم حالياً.</div>"#.to_string()
    } else {
        products.iter().map(product_card).collect()
    };

    let body = format!(
        r#"{banner}<section class="card"><h1>{heading}</h1><p class="muted">{subtitle}</p></section>
        <section class="grid">{cards}</section>"#,
        banner = storage_banner(degraded),
        heading = copy.heading,
        subtitle = copy.subtitle,
    );
    layout(copy.heading, &body, "")
}

pub fn new_chat_page(products: &[Product], selected: Option<&str>, degraded: bool) -> String {
    let selected = selected
        .filter(|id| products.iter().any(|p| p.id == *id))
        .or_else(|| products.first().map(|p| p.id.as_str()));

    let options: String = products
        .iter()
        .map(|p| {
            format!(
                r#"<option value="{id}"{sel}>{title} ({price} دج)</option>"#,
                id = escape(&p.id),
                sel = if Some(p.id.as_str()) == selected { " selected" } else { "" },
                title = escape(&p.title),
                price = p.price,
            )
        })
        .collect();

    let banner = storage_banner(degraded);
    let body = format!(
        r#"{banner}<section class="card">
            <h1>محادثة جديدة</h1>
            <p class="muted">اكتب رسالتك وسيقوم الأدمن بالرد عليك هنا.</p>
            <form id="new-chat">
                <label>المنتج<select name="productId">{options}</select></label>
                <label>الاسم<input name="customerName" autocomplete="name"></label>
                <label>واتساب (اختياري)<input name="whatsapp" inputmode="tel"></label>
                <label>الرسالة<textarea name="text" rows="4"></textarea></label>
                <div id="error" class="error"></div>
                <button class="btn" type="submit">بدء المحادثة</button>
            </form>
        </section>"#
    );

    let script = r#"
        const form = document.getElementById('new-chat');
        const errorBox = document.getElementById('error');
        form.addEventListener('submit', async (event) => {
            event.preventDefault();
            const data = Object.fromEntries(new FormData(form));
            const whatsapp = (data.whatsapp || '').trim();
            if (!data.productId) { errorBox.textContent = 'اختر المنتج أولاً.'; return; }
            if (!(data.customerName || '').trim()) { errorBox.textContent = 'اكتب اسمك.'; return; }
            if (whatsapp && whatsapp.length < 6) { errorBox.textContent = 'رقم واتساب غير صحيح.'; return; }
            if (!(data.text || '').trim()) { errorBox.textContent = 'اكتب رسالتك.'; return; }

            const button = form.querySelector('button');
            button.disabled = true;
            errorBox.textContent = '';
            const res = await fetch('/api/chats', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({
                    productId: data.productId,
                    customerName: data.customerName.trim(),
                    whatsapp: whatsapp || undefined,
                    text: data.text.trim(),
                }),
            });
            button.disabled = false;
            if (!res.ok) { errorBox.textContent = 'تعذر إنشاء المحادثة. حاول مرة أخرى.'; return; }
            const { id } = await res.json();
            window.location.href = '/chat/' + encodeURIComponent(id);
        });
    "#;

    layout("محادثة جديدة", &body, script)
}

/// Shared client-side helpers for the chat views.
const SCRIPT_HELPERS: &str = r#"
        const esc = (s) => String(s ?? '').replace(/[&<>"']/g, (c) => ({
            '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;'
        })[c]);
        const when = (iso) => new Date(iso).toLocaleString();
"#;

pub fn chat_page(chat_id: &str) -> String {
    let body = format!(
        r#"<section class="card" id="chat" data-chat-id="{id}">
            <div class="row" style="justify-content: space-between;">
                <div><h1>المحادثة</h1><p class="muted">سيقوم الأدمن بالرد عليك هنا.</p></div>
                <a class="btn secondary" href="/">الرئيسية</a>
            </div>
            <div id="meta" class="muted"></div>
            <div id="thread" class="card thread"><div class="muted">جاري تحميل المحادثة...</div></div>
            <form id="send" class="row" style="margin-top: 12px;">
                <input name="text" placeholder="اكتب رسالة..." style="flex: 1;">
                <button class="btn" type="submit">إرسال</button>
            </form>
        </section>"#,
        id = escape(chat_id),
    );

    let script = format!(
        r#"{SCRIPT_HELPERS}
        const chatId = document.getElementById('chat').dataset.chatId;
        const thread = document.getElementById('thread');
        const meta = document.getElementById('meta');
        let lastCount = -1;

        async function load() {{
            const res = await fetch('/api/chats/' + encodeURIComponent(chatId), {{ cache: 'no-store' }});
            if (!res.ok) {{
                thread.innerHTML = '<div class="error">' + (res.status === 404
                    ? 'لم يتم العثور على المحادثة.' : 'تعذر تحميل المحادثة.') + '</div>';
                return;
            }}
            const chat = await res.json();
            meta.innerHTML = 'المنتج: ' + esc(chat.productTitle || chat.productId)
                + ' • الاسم: ' + esc(chat.customerName)
                + (chat.whatsapp ? ' • واتساب: ' + esc(chat.whatsapp) : '');
            thread.innerHTML = chat.messages.length === 0
                ? '<div class="muted">لا توجد رسائل بعد.</div>'
                : chat.messages.map((m) => '<div class="bubble ' + esc(m.from) + '"><div>'
                    + esc(m.text) + '</div><div class="muted">' + esc(when(m.createdAt)) + '</div></div>').join('');
            if (chat.messages.length !== lastCount) {{
                thread.scrollTop = thread.scrollHeight;
                lastCount = chat.messages.length;
            }}
        }}

        document.getElementById('send').addEventListener('submit', async (event) => {{
            event.preventDefault();
            const input = event.target.elements.text;
            const text = input.value.trim();
            if (!text) return;
            const res = await fetch('/api/chats/' + encodeURIComponent(chatId), {{
                method: 'POST',
                headers: {{ 'Content-Type': 'application/json' }},
                body: JSON.stringify({{ from: 'customer', text }}),
            }});
            if (res.ok) {{ input.value = ''; await load(); }}
        }});

        load();
        setInterval(load, {CHAT_POLL_MS});
    "#
    );

    layout("المحادثة", &body, &script)
}

pub fn admin_login_page() -> String {
    let body = r#"<section class="card" style="max-width: 420px; margin: 0 auto; width: 100%;">
            <h1>دخول الإدارة</h1>
            <form id="login">
                <label>كلمة المرور<input type="password" name="password" autocomplete="current-password"></label>
                <div id="error" class="error"></div>
                <button class="btn" type="submit">دخول</button>
            </form>
        </section>"#;

    let script = r#"
        document.getElementById('login').addEventListener('submit', async (event) => {
            event.preventDefault();
            const password = event.target.elements.password.value;
            const res = await fetch('/api/admin/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ password }),
            });
            if (res.ok) { window.location.href = '/admin'; return; }
            document.getElementById('error').textContent = 'كلمة المرور غير صحيحة.';
        });
    "#;

    layout("دخول الإدارة", body, script)
}

pub fn admin_page() -> String {
    let category_options: String = Category::ALL
        .iter()
        .map(|c| format!(r#"<option value="{0}">{0}</option>"#, c.as_str()))
        .collect();

    let body = format!(
        r#"<section class="card error" id="storage-error" hidden>تعذر قراءة البيانات من التخزين. تحقق من إعدادات KV أو Upstash.</section>
        <section class="card row" style="justify-content: space-between;">
            <h1>لوحة التحكم</h1>
            <button class="btn secondary" id="logout">تسجيل الخروج</button>
        </section>

        <section class="card">
            <h2 id="form-title">إضافة منتج</h2>
            <form id="product-form">
                <input type="hidden" name="id">
                <div class="grid">
                    <label>القسم<select name="category">{category_options}</select></label>
                    <label>العنوان<input name="title"></label>
                    <label>السعر<input name="price" type="number" min="0" step="any"></label>
                    <label>الصورة<input name="image" placeholder="/uploads/..."></label>
                </div>
                <label>الوصف<textarea name="description" rows="3"></textarea></label>
                <div class="row">
                    <input type="file" id="image-file" accept="image/*" style="width: auto;">
                    <button class="btn secondary" type="button" id="upload">رفع الصورة</button>
                    <button class="btn" type="submit">حفظ</button>
                    <button class="btn secondary" type="button" id="reset">جديد</button>
                </div>
                <div id="product-error" class="error"></div>
            </form>
        </section>

        <section class="card">
            <h2>المنتجات</h2>
            <table>
                <thead><tr><th>القسم</th><th>العنوان</th><th>السعر</th><th></th></tr></thead>
                <tbody id="products"></tbody>
            </table>
        </section>

        <section class="card">
            <h2>المحادثات</h2>
            <div class="split">
                <div id="chat-list"></div>
                <div>
                    <div id="chat-meta" class="muted"></div>
                    <div id="chat-thread" class="card thread"><div class="muted">اختر محادثة.</div></div>
                    <form id="reply" class="row" style="margin-top: 12px;">
                        <input name="text" placeholder="اكتب ردك..." style="flex: 1;">
                        <button class="btn" type="submit">إرسال</button>
                        <button class="btn danger" type="button" id="delete-chat">حذف المحادثة</button>
                    </form>
                </div>
            </div>
        </section>"#
    );

    let script = format!(
        r##"{SCRIPT_HELPERS}
        let products = [];
        let chats = [];
        let selectedChat = null;

        const form = document.getElementById('product-form');
        const productError = document.getElementById('product-error');

        async function api(method, url, body) {{
            const init = {{ method, cache: 'no-store', headers: {{}} }};
            if (body instanceof FormData) {{
                init.body = body;
            }} else if (body !== undefined) {{
                init.headers['Content-Type'] = 'application/json';
                init.body = JSON.stringify(body);
            }}
            const res = await fetch(url, init);
            if (method === 'GET') {{
                document.getElementById('storage-error').hidden =
                    res.headers.get('{STORAGE_STATUS_HEADER}') !== 'degraded';
            }}
            if (res.status === 401) {{
                window.location.href = '/admin/login';
                throw new Error('unauthorized');
            }}
            const data = await res.json().catch(() => null);
            if (!res.ok) throw new Error((data && data.error) || res.statusText);
            return data;
        }}

        function resetForm() {{
            form.reset();
            form.elements.id.value = '';
            document.getElementById('form-title').textContent = 'إضافة منتج';
            productError.textContent = '';
        }}

        function editProduct(id) {{
            const p = products.find((x) => x.id === id);
            if (!p) return;
            form.elements.id.value = p.id;
            form.elements.category.value = p.category;
            form.elements.title.value = p.title;
            form.elements.price.value = p.price;
            form.elements.image.value = p.image || '';
            form.elements.description.value = p.description;
            document.getElementById('form-title').textContent = 'تعديل منتج';
        }}

        async function deleteProduct(id) {{
            if (!confirm('حذف المنتج؟')) return;
            await api('DELETE', '/api/products/' + encodeURIComponent(id));
            await loadProducts();
        }}

        async function loadProducts() {{
            products = await api('GET', '/api/products');
            document.getElementById('products').innerHTML = products.map((p) =>
                '<tr><td>' + esc(p.category) + '</td><td>' + esc(p.title) + '</td><td>' + esc(p.price) + '</td>'
                + '<td class="row"><button class="btn secondary" data-edit="' + esc(p.id) + '">تعديل</button>'
                + '<button class="btn danger" data-delete="' + esc(p.id) + '">حذف</button></td></tr>'
            ).join('');
        }}

        document.getElementById('products').addEventListener('click', (event) => {{
            const t = event.target;
            if (t.dataset.edit) editProduct(t.dataset.edit);
            if (t.dataset.delete) deleteProduct(t.dataset.delete).catch((e) => alert(e.message));
        }});

        form.addEventListener('submit', async (event) => {{
            event.preventDefault();
            const data = Object.fromEntries(new FormData(form));
            const body = {{
                category: data.category,
                title: data.title,
                price: Number(data.price || 0),
                description: data.description,
                image: data.image || undefined,
            }};
            try {{
                if (data.id) {{
                    await api('PUT', '/api/products/' + encodeURIComponent(data.id), body);
                }} else {{
                    await api('POST', '/api/products', body);
                }}
                resetForm();
                await loadProducts();
            }} catch (e) {{
                productError.textContent = 'تعذر حفظ المنتج: ' + e.message;
            }}
        }});

        document.getElementById('reset').addEventListener('click', resetForm);

        document.getElementById('upload').addEventListener('click', async () => {{
            const file = document.getElementById('image-file').files[0];
            if (!file) return;
            const fd = new FormData();
            fd.append('file', file);
            try {{
                const {{ url }} = await api('POST', '/api/upload', fd);
                form.elements.image.value = url;
            }} catch (e) {{
                productError.textContent = 'تعذر رفع الصورة: ' + e.message;
            }}
        }});

        function renderChats() {{
            document.getElementById('chat-list').innerHTML = chats.length === 0
                ? '<div class="muted">لا توجد محادثات.</div>'
                : chats.map((c) => '<div class="chat-item' + (c.id === selectedChat ? ' active' : '')
                    + '" data-chat="' + esc(c.id) + '"><strong>' + esc(c.customerName) + '</strong>'
                    + '<div class="muted">' + esc(c.productTitle || c.productId) + ' • ' + esc(when(c.createdAt)) + '</div></div>'
                ).join('');

            const chat = chats.find((c) => c.id === selectedChat);
            const thread = document.getElementById('chat-thread');
            const meta = document.getElementById('chat-meta');
            if (!chat) {{
                meta.textContent = '';
                thread.innerHTML = '<div class="muted">اختر محادثة.</div>';
                return;
            }}
            const snap = chat.product;
            meta.innerHTML = esc(chat.customerName)
                + (chat.whatsapp ? ' • واتساب: ' + esc(chat.whatsapp) : '')
                + (snap ? ' • ' + esc(snap.title) + ' (' + esc(snap.price) + ' دج)' : '');
            thread.innerHTML = chat.messages.map((m) => '<div class="bubble ' + esc(m.from) + '"><div>'
                + esc(m.text) + '</div><div class="muted">' + esc(when(m.createdAt))
                + ' <a href="#" data-message="' + esc(m.id) + '">حذف</a></div></div>').join('');
        }}

        async function loadChats() {{
            chats = await api('GET', '/api/chats');
            renderChats();
        }}

        document.getElementById('chat-list').addEventListener('click', (event) => {{
            const item = event.target.closest('[data-chat]');
            if (!item) return;
            selectedChat = item.dataset.chat;
            renderChats();
        }});

        document.getElementById('chat-thread').addEventListener('click', async (event) => {{
            const id = event.target.dataset.message;
            if (!id || !selectedChat) return;
            event.preventDefault();
            await api('DELETE', '/api/chats/' + encodeURIComponent(selectedChat) + '/messages/' + encodeURIComponent(id));
            await loadChats();
        }});

        document.getElementById('reply').addEventListener('submit', async (event) => {{
            event.preventDefault();
            const input = event.target.elements.text;
            const text = input.value.trim();
            if (!text || !selectedChat) return;
            await api('POST', '/api/chats/' + encodeURIComponent(selectedChat), {{ from: 'admin', text }});
            input.value = '';
            await loadChats();
        }});

        document.getElementById('delete-chat').addEventListener('click', async () => {{
            if (!selectedChat || !confirm('حذف المحادثة؟')) return;
            await api('DELETE', '/api/chats/' + encodeURIComponent(selectedChat));
            selectedChat = null;
            await loadChats();
        }});

        document.getElementById('logout').addEventListener('click', async () => {{
            await fetch('/api/admin/logout', {{ method: 'POST' }});
            window.location.href = '/admin/login';
        }});

        loadProducts().catch((e) => {{ productError.textContent = e.message; }});
        loadChats().catch(() => {{}});
        setInterval(() => loadChats().catch(() => {{}}), {ADMIN_POLL_MS});
    "##
    );

    layout("لوحة التحكم", &body, &script)
}

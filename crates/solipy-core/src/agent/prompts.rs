//! System prompts and user-message builders for the three LLM flows:
//! script generation, script debugging and free-form guidance.

/// Connection boilerplate every generated script must start with.
pub const CONNECT_SNIPPET: &str = r#"Dim swApp
On Error Resume Next
WScript.Echo "در حال اتصال به SolidWorks..."
Set swApp = GetObject(, "SldWorks.Application")
If Err.Number <> 0 Then
    Err.Clear
    WScript.Echo "SolidWorks در حال اجرا نیست. تلاش برای اجرای SolidWorks..."
    Set swApp = CreateObject("SldWorks.Application")
    If Err.Number <> 0 Then
        WScript.Echo "خطا در اتصال به SolidWorks: " & Err.Description
        WScript.Quit(1)
    End If
End If
swApp.Visible = True
WScript.Echo "اتصال به SolidWorks با موفقیت انجام شد."
On Error Goto 0"#;

/// Persian phrases the model should recognise, with their English meaning.
pub const PERSIAN_GLOSSARY: &[(&str, &str)] = &[
    ("\"دایره بکش\" or \"یک دایره بکش\" or \"رسم دایره\"", "Draw a circle"),
    ("\"مستطیل بکش\" or \"یک مستطیل بکش\"", "Draw a rectangle"),
    ("\"خط بکش\"", "Draw a line"),
    ("\"اکسترود کن\"", "Extrude"),
    ("\"برش بزن\"", "Cut"),
    ("\"ذخیره کن\"", "Save"),
];

pub fn build_generation_system_prompt() -> String {
    let mut prompt = String::from(
        "You are an expert in SolidWorks automation with VBScript. \n\
Your task is to generate VBScript code that can automate SolidWorks operations.\n\
You MUST understand user instructions in both English and Persian (Farsi) language.\n\
When user instructions are in Persian, you should understand words like \"بکش\", \"دایره\", \"خط\", \"مستطیل\", etc.\n\
Keep your responses focused only on the VBScript code without any explanations.\n\n\
IMPORTANT: Always structure your script in this sequence:\n\
1. Start with 'Option Explicit'\n\
2. Include connection code that connects to SolidWorks first:\n\n",
    );
    prompt.push_str(CONNECT_SNIPPET);
    prompt.push_str(
        "\n\n3. Create or open a document\n\
4. Implement the requested feature or operation\n\
5. Include proper error handling\n\n\
The script must run independently and include all necessary code to connect to SolidWorks, \n\
not relying on any external functions or files.\n\
Always end with a success message and return 0 exit code on success.\n\n\
PERSIAN COMMANDS GLOSSARY:\n",
    );
    for (phrase, meaning) in PERSIAN_GLOSSARY {
        prompt.push_str(&format!("- {} = {}\n", phrase, meaning));
    }
    prompt
}

pub fn build_generation_message(query: &str) -> String {
    format!(
        "Create a VBScript to automate the following SolidWorks task: {}. \
Only respond with the complete VBScript code without any explanations.",
        query.trim()
    )
}

pub const DEBUG_SYSTEM_PROMPT: &str = r#"You are an expert VBScript debugger for SolidWorks automation.
Your task is to analyze the provided VBScript code and error message, then fix the issue.
Focus on common VBScript errors such as:
1. Syntax errors (missing parentheses, wrong variable names)
2. "Cannot use parentheses when calling a Sub" error - in VBScript function calls that return values use parentheses, but Sub calls do not use parentheses
3. Invalid characters or encoding issues
4. Incorrect method calls or parameters for SolidWorks API
5. Issues with object references or method parameters

Respond with:
1. The fixed script - provide the complete corrected script
2. A brief explanation of what you fixed and why
"#;

pub fn build_debug_message(script: &str, error_message: &str) -> String {
    format!(
        "Debug this VBScript code for SolidWorks automation. Here's the script:\n\n\
```vbs\n{}\n```\n\n\
Here's the error message:\n{}\n\n\
Please fix the code and explain what was wrong.",
        script, error_message
    )
}

pub const GUIDANCE_SYSTEM_PROMPT: &str = r#"You are an expert in VBScript programming for SolidWorks automation.
You help users debug their SolidWorks scripts and provide guidance on script development.
Focus on providing practical, specific advice that users can immediately apply to fix their code or improve their scripts.
Your expertise includes:
1. SolidWorks API methods and best practices
2. VBScript syntax and common errors
3. Debugging techniques for automation scripts
4. Best practices for SolidWorks automation

Respond in Persian (Farsi) language with:
1. Clear, step-by-step advice for the user's specific question
2. Code examples when relevant
3. Explanations of common mistakes or misconceptions
"#;

/// Placeholder shown in the empty guidance box; never sent as a question.
pub const GUIDANCE_PLACEHOLDER: &str =
    "سوال یا مشکل خود را درباره دیباگ یا طراحی اسکریپت‌های SolidWorks اینجا بنویسید...";

pub const GUIDANCE_SUGGESTIONS: &[&str] = &[
    "چگونه می‌توانم یک خطای Object referenced has been disconnected را رفع کنم؟",
    "چطور باید یک مدل سه‌بعدی در SolidWorks با VBScript ایجاد کنم؟",
    "روش اضافه کردن قید بین قطعات در SolidWorks چیست؟",
    "چگونه می‌توانم از خواص سفارشی در مدل‌های SolidWorks استفاده کنم؟",
    "چرا اسکریپت من با خطای Type mismatch مواجه می‌شود؟",
];

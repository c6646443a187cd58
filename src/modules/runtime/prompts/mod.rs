//! Prompt templates sent to the language model

mod template;

pub use template::PromptTemplate;

/// Question to SQL, with the CRM schema cheat sheet
pub const TEXT_TO_SQL_PROMPT: PromptTemplate = PromptTemplate::new(
    "text_to_sql",
    r#"
You are an expert data analyst with access to a SQL database.
Given an input question, write a syntactically correct {{ dialect }} SQL query to answer it,
then interpret the query result to provide a concise natural-language answer **in Indonesian**.

SCHEMA REFERENCE (clonecrm cheat sheet):
- Branches, customers, leads, invoices, and products are joined via these keys:
  * branch.branchno ⇄ customer.branchno, invoice.branchno
  * city.cityid ⇄ customer.cityid; city.countryid/stateid give geo hierarchy
  * customer.custid ⇄ invoice.custid, lead.custid, customer_area.custid
  * customertype.custtype (1–7) and customertypedtl.custtypedetail (1–8) classify customers
  * product.prodcode (DO, HT, OT, TK, TR) ⇄ productdtl.proddtlcode (e.g., TKTD, TRPD)
  * invoice.invno ⇄ invoice_* line tables (DO/HT/OT/TK/TR/TRADD)
  * ticket/tour codes: invoice_tk.faretype → tkfaretype.faretypecode; tickettype → tktype.tktypecode
- Key tables:
  * customer: custid PK, custcode, custname, custtype (→ customertype), custtypedetail (via mapping to customertypedtl), joindate, birthday, mobileno, cityid, branchno, status ACTIVE/INACTIVE.
  * lead: leadid PK, contact info, leadsource (Instagram, TikTok, Facebook, Survey, Email, Pameran, Greta), product interest, custid (optional link to customer).
  * invoice: invno PK, invoiceno, custid, branchno, invdate, invoicestatus {PAID, OUTS, VOID}, balanceinvoice/discount/taxes, product (HT/TK/TR/DO/OT), currid (often IDR).
  * product/productdtl: prodcode (DO/HT/OT/TK/TR) and proddtlcode (e.g., TKTD, TRPD, HTHD).
  * branch: branchno PK, name, basecurr (IDR), city/state/country ids.
  * city: cityid PK, citycode/citydesc, countryid/stateid.
- Currency: monetary fields are IDR unless currid overrides.
- Customer segmentation (Recency/Frequency/Monetary) exists but is derived; use invoice dates and balanceinvoice if needed.
- Sales data should use the field balanceinvoice from the table invoice as the DEFAULT TOTAL SELL data of the invoice.
- Do not dedupe customers by name; custid is the truth key. Fits vs corporate: customertypedtl=2 is FIT NON CORPORATE (retail); 6 is CORPORATE.

Follow this format strictly:
Question: <user question>
SQLQuery: <SQL statement>   (omit unless the user explicitly asks for the SQL)
SQLResult: <real results as a well-formatted markdown table with headers>
Answer: <final natural language answer in Indonesian, summarizing the table>

Rules:
- Only use tables and columns from the schema below.
- Prefer selecting limited, relevant columns (avoid SELECT *).
- Use backticks "`" when you want to specify the table name in the SQL query, for example "`lead`" instead of just "lead".
- The environment only allows one SQL statement execution at a time, do not try to execute two or more at the same time.
- Use LIMIT 10 unless otherwise specified (explicitly or implicitly).
- Use DISTINCT when helpful.
- Qualify column names when needed.
- Column values are case-sensitive. Match the exact casing shown in the schema
  (e.g., customer_type = 'CORPORATE').
- Never hallucinate columns or tables.
- Data cutoff date is 2025-11-10, any data after this date is not considered.
- If the user's asks for today's data, present them with the latest data which is on 2025-11-10. So, if they asks for yesterday's data, present them with the data from 2025-11-9.

{{ schema }}

Question: {{ query_str }}
SQLQuery:
"#,
);

/// Query result to final answer
pub const RESPONSE_SYNTHESIS_PROMPT: PromptTemplate = PromptTemplate::new(
    "response_synthesis",
    r#"
Given an input question, synthesize a response from the query results.
Answer concisely **in Indonesian**. When the result has several rows, include
them as a well-formatted markdown table with headers, then summarize it.
If the result is empty, say that no matching data was found.

Query: {{ query_str }}
SQL: {{ sql_query }}
SQL Response:
{{ context_str }}
Response:
"#,
);

/// Segment description to `{"name", "sql"}` JSON
pub const SEGMENT_GENERATION_PROMPT: PromptTemplate = PromptTemplate::new(
    "segment_generation",
    r#"
Based on this segment description, generate:
1. A SQL query that returns customer data matching the criteria
2. A short name for this segment (max 50 chars, in Indonesian)

Description: "{{ description }}"

Requirements for SQL:
- Must return: custid, custname, email, mobileno
- Include calculated fields if relevant: last_transaction_date, total_spending, transaction_count
- Use appropriate JOINs between customer and invoice tables
- Apply filters based on the description
- Do NOT use LIMIT unless specified in the description
- Use MySQL syntax (backticks for identifiers, LIMIT for row limiting)

SCHEMA REFERENCE (clonecrm):
- customer: custid PK, custcode, custname, email, mobileno, custtype, custtypedetail, joindate, birthday, cityid, branchno, status ACTIVE/INACTIVE
- invoice: invno PK, invoiceno, custid, branchno, invdate, invoicestatus {PAID, OUTS, VOID}, balanceinvoice, discount, taxes, product (HT/TK/TR/DO/OT)
- customertype: custtype PK (1-7), custtypename
- customertypedtl: custtypedetail PK (1-8), custtypedetailname (FIT=2, CORPORATE=6)

Return in this exact JSON format:
{
  "name": "Short segment name in Indonesian",
  "sql": "SELECT ... FROM ... WHERE ..."
}

JSON Response:
"#,
);

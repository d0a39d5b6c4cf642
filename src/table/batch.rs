use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::types::{DeleteRequest, PutRequest, WriteRequest};

use crate::Error;
use crate::table::types::{ItemKey, Mutation};

fn to_write_request(mutation: Mutation) -> Result<WriteRequest, Error> {
    let request = match mutation {
        Mutation::Put(item) => {
            let put_request = PutRequest::builder().set_item(Some(item)).build()?;
            WriteRequest::builder().put_request(put_request).build()
        }
        Mutation::Delete(key) => {
            let delete_request = DeleteRequest::builder()
                .set_key(Some(key.into_attributes()))
                .build()?;
            WriteRequest::builder()
                .delete_request(delete_request)
                .build()
        }
    };

    Ok(request)
}

fn from_write_request(request: WriteRequest) -> Option<Mutation> {
    if let Some(put_request) = request.put_request {
        return Some(Mutation::Put(put_request.item));
    }

    request
        .delete_request
        .map(|delete_request| Mutation::Delete(ItemKey::new(delete_request.key)))
}

/// Send one `BatchWriteItem` request without retry logic
///
/// Returns the mutations DynamoDB reported as unprocessed for `table`.
pub(super) async fn batch_write_internal(
    client: &Client,
    table: &str,
    pending: Vec<Mutation>,
) -> Result<Vec<Mutation>, Error> {
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let write_ops = pending
        .into_iter()
        .map(to_write_request)
        .collect::<Result<Vec<_>, _>>()?;

    let output = client
        .batch_write_item()
        .request_items(table, write_ops)
        .send()
        .await?;

    let unprocessed = output
        .unprocessed_items
        .and_then(|mut tables| tables.remove(table))
        .unwrap_or_default()
        .into_iter()
        .filter_map(from_write_request)
        .collect();

    Ok(unprocessed)
}

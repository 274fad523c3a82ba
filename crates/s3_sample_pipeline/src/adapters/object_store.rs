pub trait ObjectStore {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String>;
}

impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), String> {
        (**self).put_object(bucket, key, body)
    }
}
